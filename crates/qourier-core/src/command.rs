//! Command registry and the typed handler adapter.
//!
//! A handler is an async closure taking the message and one typed
//! parameter per non-ignored specifier in its template, in template order.
//! [`Registry::register`] checks that pairing once, eagerly: a command
//! whose closure shape disagrees with its template is a
//! [`RegistrationError`] at startup, never a surprise on the first unlucky
//! message.

use crate::error::{CommandError, RegistrationError};
use crate::syntax::{ArgKind, ArgValue, SyntaxTemplate};
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use traq_client::Message;

/// Type-erased invoker produced at registration.
pub type Callable =
    Arc<dyn Fn(Message, Vec<ArgValue>) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// A native type an [`ArgValue`] maps onto positionally.
pub trait FromArg: Sized {
    const KIND: ArgKind;

    /// Convert a matched value of the declared kind.
    ///
    /// Panics on a kind mismatch: registration validated the handler shape
    /// against the same template the matcher ran, so a divergence here is
    /// a programming error, not user input.
    fn from_arg(value: ArgValue) -> Self;
}

impl FromArg for String {
    const KIND: ArgKind = ArgKind::Str;

    fn from_arg(value: ArgValue) -> Self {
        match value {
            ArgValue::Str(text) => text,
            other => panic!(
                "matcher produced {:?} where the validated template promised a string",
                other.kind()
            ),
        }
    }
}

impl FromArg for i64 {
    const KIND: ArgKind = ArgKind::Int;

    fn from_arg(value: ArgValue) -> Self {
        match value {
            ArgValue::Int(n) => n,
            other => panic!(
                "matcher produced {:?} where the validated template promised an int",
                other.kind()
            ),
        }
    }
}

/// Implemented for async closures `Fn(Message, ...typed args)` of up to
/// eight typed parameters, via [`impl_command_handler!`](macro).
pub trait IntoCommandHandler<Args>: Send + Sync + 'static {
    /// Static parameter shape, compared against the template at
    /// registration.
    const SHAPE: &'static [ArgKind];

    fn into_callable(self) -> Callable;
}

fn next_arg(args: &mut std::vec::IntoIter<ArgValue>) -> ArgValue {
    match args.next() {
        Some(value) => value,
        None => panic!("parsed arguments ran out before the validated shape was filled"),
    }
}

macro_rules! impl_command_handler {
    ($($ty:ident),*) => {
        impl<F, Fut, $($ty,)*> IntoCommandHandler<($($ty,)*)> for F
        where
            F: Fn(Message, $($ty),*) -> Fut + Send + Sync + 'static,
            Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
            $($ty: FromArg + Send + 'static,)*
        {
            const SHAPE: &'static [ArgKind] = &[$($ty::KIND),*];

            fn into_callable(self) -> Callable {
                Arc::new(move |message, args| {
                    let shape = <Self as IntoCommandHandler<($($ty,)*)>>::SHAPE;
                    assert_eq!(
                        args.len(),
                        shape.len(),
                        "parsed argument count diverged from the validated template",
                    );
                    #[allow(unused_mut, unused_variables)]
                    let mut args = args.into_iter();
                    #[allow(non_snake_case)]
                    let future = {
                        $(let $ty = $ty::from_arg(next_arg(&mut args));)*
                        self(message, $($ty),*)
                    };
                    Box::pin(future)
                })
            }
        }
    };
}

impl_command_handler!();
impl_command_handler!(A1);
impl_command_handler!(A1, A2);
impl_command_handler!(A1, A2, A3);
impl_command_handler!(A1, A2, A3, A4);
impl_command_handler!(A1, A2, A3, A4, A5);
impl_command_handler!(A1, A2, A3, A4, A5, A6);
impl_command_handler!(A1, A2, A3, A4, A5, A6, A7);
impl_command_handler!(A1, A2, A3, A4, A5, A6, A7, A8);

/// A registered command: name, template, and the validated invoker.
#[derive(Clone)]
pub struct Command {
    name: String,
    template: SyntaxTemplate,
    callable: Callable,
}

impl Command {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template(&self) -> &SyntaxTemplate {
        &self.template
    }

    /// Match `option` against the template and invoke the handler with the
    /// typed arguments, message first.
    pub async fn execute(&self, message: Message, option: &str) -> Result<(), CommandError> {
        let args = self.template.match_args(option)?;
        (self.callable)(message, args)
            .await
            .map_err(CommandError::Handler)
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("template", &self.template.source())
            .finish_non_exhaustive()
    }
}

/// The command registry, built once at startup and read-only afterwards.
#[derive(Debug, Default)]
pub struct Registry {
    commands: HashMap<String, Arc<Command>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under `name` with the given syntax template.
    ///
    /// Fails when the handler's parameter shape does not line up with the
    /// template's non-ignored specifiers.
    pub fn register<Args, H>(
        &mut self,
        name: &str,
        template: &str,
        handler: H,
    ) -> Result<(), RegistrationError>
    where
        H: IntoCommandHandler<Args>,
    {
        let template = SyntaxTemplate::parse(template);
        validate_shape(name, &template, H::SHAPE)?;

        let command = Command {
            name: name.to_string(),
            template,
            callable: handler.into_callable(),
        };
        self.commands.insert(name.to_string(), Arc::new(command));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Command>> {
        self.commands.get(name)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Compare a handler's typed parameters against the template, position by
/// position. Parameter indices in errors count the message as argument 1.
fn validate_shape(
    name: &str,
    template: &SyntaxTemplate,
    shape: &[ArgKind],
) -> Result<(), RegistrationError> {
    let kinds = template.arg_kinds();

    for (position, (&expected, &found)) in kinds.iter().zip(shape.iter()).enumerate() {
        if expected != found {
            return Err(RegistrationError::ParameterType {
                command: name.to_string(),
                index: position + 2,
                expected: expected.type_name(),
            });
        }
    }

    if shape.len() < kinds.len() {
        return Err(RegistrationError::MissingParameter {
            command: name.to_string(),
        });
    }
    if shape.len() > kinds.len() {
        return Err(RegistrationError::ExtraParameter {
            command: name.to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_message;
    use std::sync::Mutex;

    #[test]
    fn register_accepts_matching_shape() {
        let mut registry = Registry::new();
        let result = registry.register(
            "set",
            "%s %d:%d",
            |_ms: Message, _day: String, _hour: i64, _min: i64| async move { anyhow::Ok(()) },
        );

        assert!(result.is_ok());
        assert!(registry.get("set").is_some());
    }

    #[test]
    fn register_accepts_zero_argument_command() {
        let mut registry = Registry::new();
        let result = registry.register("get", "", |_ms: Message| async move { anyhow::Ok(()) });
        assert!(result.is_ok());
    }

    #[test]
    fn register_rejects_missing_parameters() {
        let mut registry = Registry::new();
        let result = registry.register("set", "%s %d", |_ms: Message, _day: String| async move {
            anyhow::Ok(())
        });

        assert!(matches!(
            result,
            Err(RegistrationError::MissingParameter { command }) if command == "set"
        ));
    }

    #[test]
    fn register_rejects_extra_parameters() {
        let mut registry = Registry::new();
        let result = registry.register(
            "get",
            "",
            |_ms: Message, _stray: String| async move { anyhow::Ok(()) },
        );

        assert!(matches!(
            result,
            Err(RegistrationError::ExtraParameter { command }) if command == "get"
        ));
    }

    #[test]
    fn register_rejects_wrong_parameter_type() {
        let mut registry = Registry::new();
        let result = registry.register(
            "set",
            "%s %d",
            |_ms: Message, _day: String, _hour: String| async move { anyhow::Ok(()) },
        );

        assert!(matches!(
            result,
            Err(RegistrationError::ParameterType {
                command,
                index: 3,
                expected: "int",
            }) if command == "set"
        ));
    }

    #[test]
    fn ignored_specifiers_do_not_count_toward_shape() {
        let mut registry = Registry::new();
        let result = registry.register(
            "range",
            "%d %x %d",
            |_ms: Message, _from: i64, _to: i64| async move { anyhow::Ok(()) },
        );
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn execute_passes_typed_arguments_in_order() {
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);

        let mut registry = Registry::new();
        registry
            .register(
                "set",
                "%s %d:%d",
                move |_ms: Message, day: String, hour: i64, min: i64| {
                    let sink = Arc::clone(&sink);
                    async move {
                        *sink.lock().unwrap() = Some((day, hour, min));
                        anyhow::Ok(())
                    }
                },
            )
            .unwrap();

        let command = registry.get("set").unwrap();
        command
            .execute(test_message("anything"), "Sunday 21:00")
            .await
            .unwrap();

        assert_eq!(
            seen.lock().unwrap().take(),
            Some(("Sunday".to_string(), 21, 0))
        );
    }

    #[tokio::test]
    async fn execute_surfaces_matcher_failures() {
        let mut registry = Registry::new();
        registry
            .register("set", "%s %d", |_ms: Message, _a: String, _b: i64| async move {
                anyhow::Ok(())
            })
            .unwrap();

        let command = registry.get("set").unwrap();
        let result = command.execute(test_message(""), "alone").await;
        assert!(matches!(result, Err(CommandError::ArgumentCount)));
    }

    #[tokio::test]
    async fn execute_surfaces_handler_failures() {
        let mut registry = Registry::new();
        registry
            .register("boom", "", |_ms: Message| async move {
                Err(anyhow::anyhow!("storage offline"))
            })
            .unwrap();

        let command = registry.get("boom").unwrap();
        let result = command.execute(test_message(""), "").await;
        assert!(matches!(result, Err(CommandError::Handler(_))));
    }
}
