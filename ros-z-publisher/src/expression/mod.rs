//! Expression evaluation for message fields.
//!
//! Expressions are rhai scripts evaluated in a sandbox:
//!
//! - `i` holds the owning publisher's emission counter
//! - `now()` returns the bus clock time
//! - the math, random and time libraries described in [`library`]
//!
//! There is no file, network or process access. `eval` and `import` are
//! disabled, and `print`/`debug` go to the log.
//!
//! The evaluated value is then coerced to the declared type of the target
//! field. String targets never fail: when evaluation fails the expression text
//! itself is used.

mod coerce;
pub mod library;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rhai::{AST, Dynamic, Engine, INT, Scope};
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::dynamic::{DynamicValue, FieldType};

pub(crate) use coerce::truncate;

/// Compiled expressions kept before the cache is reset.
const AST_CACHE_CAPACITY: usize = 1024;

/// Errors from evaluating an expression against a field type.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// The expression did not parse or raised at runtime
    Evaluation { expression: String, reason: String },

    /// The value is outside the compatibility group of the target type
    TypeMismatch { expected: String, found: String },

    /// The value is in the right group but cannot be represented by the target
    OutOfRange { expected: String, value: String },
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::Evaluation { reason, .. } => write!(f, "{}", reason),
            EvalError::TypeMismatch { expected, found } => {
                write!(f, "expected {}, got {}", expected, found)
            }
            EvalError::OutOfRange { expected, value } => {
                write!(f, "{} is out of range for {}", value, expected)
            }
        }
    }
}

impl std::error::Error for EvalError {}

/// The sandboxed evaluator shared by all publishers.
///
/// The function table is built once. Per-entry state (the counter) is passed
/// in on every call.
pub struct ExpressionEngine {
    engine: Engine,
    cache: Mutex<HashMap<String, AST>>,
}

impl ExpressionEngine {
    /// Create an engine reading `now()` from the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an engine reading `now()` from `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let mut engine = Engine::new();
        Self::configure_engine(&mut engine, clock);
        Self {
            engine,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn configure_engine(engine: &mut Engine, clock: Arc<dyn Clock>) {
        engine.set_max_expr_depths(64, 64);
        engine.set_max_call_levels(32);
        engine.set_max_operations(100_000);
        engine.set_max_string_size(65_536);
        engine.set_max_array_size(65_536);
        engine.set_max_map_size(1_000);

        engine.disable_symbol("eval");
        engine.disable_symbol("import");
        engine.set_module_resolver(rhai::module_resolvers::DummyModuleResolver::new());

        engine.on_print(|text| debug!(target: "ros_z_publisher::expression", "{}", text));
        engine.on_debug(|text, source, pos| {
            debug!(target: "ros_z_publisher::expression", ?source, %pos, "{}", text)
        });

        library::register_math(engine);
        library::register_random(engine, Arc::new(Mutex::new(StdRng::from_entropy())));
        library::register_time(engine, clock, Instant::now());
    }

    /// Evaluate `expression` with `i` bound to `counter` and coerce the result
    /// to `target`.
    pub fn evaluate(
        &self,
        expression: &str,
        target: &FieldType,
        counter: u64,
    ) -> Result<DynamicValue, EvalError> {
        let result = self.eval_dynamic(expression, counter);

        if target.is_string() {
            let text = match result {
                Ok(value) => coerce::stringify(value, target),
                Err(_) => coerce::truncate(expression.to_string(), target),
            };
            return Ok(DynamicValue::String(text));
        }

        let coerced = result.and_then(|value| coerce::coerce(value, target));
        if let Err(e) = &coerced {
            warn!("Expression '{}' as \"{}\": {}", expression, target, e);
        }
        coerced
    }

    /// Evaluate without coercion.
    pub fn eval_dynamic(&self, expression: &str, counter: u64) -> Result<Dynamic, EvalError> {
        let ast = self.compile(expression)?;
        let mut scope = Scope::new();
        scope.push_constant("i", INT::try_from(counter).unwrap_or(INT::MAX));
        self.engine
            .eval_ast_with_scope::<Dynamic>(&mut scope, &ast)
            .map_err(|e| EvalError::Evaluation {
                expression: expression.to_string(),
                reason: e.to_string(),
            })
    }

    fn compile(&self, expression: &str) -> Result<AST, EvalError> {
        let mut cache = self.cache.lock();
        if let Some(ast) = cache.get(expression) {
            return Ok(ast.clone());
        }
        let ast = self
            .engine
            .compile_expression(expression)
            .map_err(|e| EvalError::Evaluation {
                expression: expression.to_string(),
                reason: e.to_string(),
            })?;
        if cache.len() >= AST_CACHE_CAPACITY {
            cache.clear();
        }
        cache.insert(expression.to_string(), ast.clone());
        Ok(ast)
    }
}

impl Default for ExpressionEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ManualClock, Time};
    use crate::dynamic::{SchemaAccess, SchemaRegistry};

    fn engine() -> ExpressionEngine {
        ExpressionEngine::new()
    }

    #[test]
    fn test_counter_binding() {
        let e = engine();
        assert_eq!(
            e.evaluate("i * 2", &FieldType::Float64, 3).unwrap(),
            DynamicValue::Float64(6.0)
        );
        assert_eq!(
            e.evaluate("i + 1", &FieldType::Uint16, 0).unwrap(),
            DynamicValue::Uint16(1)
        );
    }

    #[test]
    fn test_division_by_zero_fails() {
        let e = engine();
        assert!(matches!(
            e.evaluate("1/0", &FieldType::Int32, 0),
            Err(EvalError::Evaluation { .. })
        ));
    }

    #[test]
    fn test_string_fallback() {
        let e = engine();
        assert_eq!(
            e.evaluate("hello world", &FieldType::String, 0).unwrap(),
            DynamicValue::String("hello world".into())
        );
        assert_eq!(
            e.evaluate("\"count \" + i", &FieldType::String, 4).unwrap(),
            DynamicValue::String("count 4".into())
        );
        assert_eq!(
            e.evaluate("i", &FieldType::String, 9).unwrap(),
            DynamicValue::String("9".into())
        );
        assert_eq!(
            e.evaluate("not valid (", &FieldType::BoundedString(3), 0).unwrap(),
            DynamicValue::String("not".into())
        );
    }

    #[test]
    fn test_math_library() {
        let e = engine();
        let v = e.evaluate("sin(0) + cos(0)", &FieldType::Float64, 0).unwrap();
        assert_eq!(v, DynamicValue::Float64(1.0));
        let v = e.evaluate("hypot(3, 4)", &FieldType::Float64, 0).unwrap();
        assert_eq!(v, DynamicValue::Float64(5.0));
        let DynamicValue::Float64(deg) = e.evaluate("degrees(pi())", &FieldType::Float64, 0).unwrap()
        else {
            panic!("expected float64");
        };
        assert!((deg - 180.0).abs() < 1e-9);
        let v = e.evaluate("fmod(7.5, 2)", &FieldType::Float64, 0).unwrap();
        assert_eq!(v, DynamicValue::Float64(1.5));
    }

    #[test]
    fn test_random_library() {
        let e = engine();
        for counter in 0..20 {
            let DynamicValue::Float64(r) = e.evaluate("random()", &FieldType::Float64, counter).unwrap()
            else {
                panic!("expected float64");
            };
            assert!((0.0..1.0).contains(&r));

            let DynamicValue::Int64(n) = e.evaluate("randint(1, 3)", &FieldType::Int64, counter).unwrap()
            else {
                panic!("expected int64");
            };
            assert!((1..=3).contains(&n));
        }
        assert!(e.evaluate("choice([])", &FieldType::Int32, 0).is_err());
        assert_eq!(
            e.evaluate("choice([5])", &FieldType::Int32, 0).unwrap(),
            DynamicValue::Int32(5)
        );
    }

    #[test]
    fn test_seed_is_reproducible() {
        let e = engine();
        e.eval_dynamic("seed(7)", 0).unwrap();
        let first = e.evaluate("random()", &FieldType::Float64, 0).unwrap();
        e.eval_dynamic("seed(7)", 0).unwrap();
        let second = e.evaluate("random()", &FieldType::Float64, 0).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_now_uses_clock() {
        let clock = ManualClock::new(Time { sec: 12, nanosec: 34 });
        let e = ExpressionEngine::with_clock(clock.clone());
        let registry = SchemaRegistry::with_bundled();
        let time = registry.resolve_type("builtin_interfaces/msg/Time").unwrap();

        let value = e.evaluate("now()", &time, 0).unwrap();
        let msg = value.as_message().unwrap();
        assert_eq!(msg.get::<i32>("sec").unwrap(), 12);
        assert_eq!(msg.get::<u32>("nanosec").unwrap(), 34);

        assert_eq!(
            e.evaluate("now().sec", &FieldType::Int32, 0).unwrap(),
            DynamicValue::Int32(12)
        );
    }

    #[test]
    fn test_sandbox() {
        let e = engine();
        assert!(e.evaluate("eval(\"1\")", &FieldType::Int32, 0).is_err());
        assert!(e.eval_dynamic("import \"x\" as y", 0).is_err());
        assert!(e.evaluate("loop {}", &FieldType::Int32, 0).is_err());
    }

    #[test]
    fn test_array_expression() {
        let e = engine();
        let target = FieldType::Array(Box::new(FieldType::Float32), 3);
        assert_eq!(
            e.evaluate("[i, i + 1, 0.5]", &target, 1).unwrap(),
            DynamicValue::Array(vec![
                DynamicValue::Float32(1.0),
                DynamicValue::Float32(2.0),
                DynamicValue::Float32(0.5),
            ])
        );
        assert!(e.evaluate("[1, 2]", &target, 0).is_err());
    }

    #[test]
    fn test_bool_target() {
        let e = engine();
        assert_eq!(
            e.evaluate("i % 2 == 0", &FieldType::Bool, 4).unwrap(),
            DynamicValue::Bool(true)
        );
        assert!(e.evaluate("1", &FieldType::Bool, 0).is_err());
    }
}
