//! Functions available to expressions.
//!
//! ## Math
//! `sin cos tan asin acos atan atan2 sinh cosh tanh sqrt exp ln log10 log2
//! pow hypot fabs floor ceil trunc degrees radians fmod`, constants `pi() e()
//! tau() inf() nan()`. Every function accepts integers as well as floats.
//!
//! ## Random
//! `random()` in `[0, 1)`, `uniform(a, b)`, `randint(a, b)` (inclusive),
//! `gauss(mu, sigma)`, `choice(array)` and `seed(n)`.
//!
//! ## Time
//! `now()` is the bus time as `#{sec, nanosec}`. `time()` and `time_ns()` are
//! wall clock seconds and nanoseconds, `monotonic()` seconds since engine start.

use std::sync::Arc;
use std::time::{Instant, SystemTime};

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use rhai::{Array, Dynamic, Engine, EvalAltResult, FLOAT, INT, Map};

use crate::clock::Clock;

type Fallible<T> = Result<T, Box<EvalAltResult>>;

macro_rules! register_unary {
    ($engine:expr, $($name:literal => $f:expr),* $(,)?) => {
        $(
            $engine.register_fn($name, |x: FLOAT| -> FLOAT { ($f)(x) });
            $engine.register_fn($name, |x: INT| -> FLOAT { ($f)(x as FLOAT) });
        )*
    };
}

macro_rules! register_binary {
    ($engine:expr, $($name:literal => $f:expr),* $(,)?) => {
        $(
            $engine.register_fn($name, |a: FLOAT, b: FLOAT| -> FLOAT { ($f)(a, b) });
            $engine.register_fn($name, |a: INT, b: INT| -> FLOAT { ($f)(a as FLOAT, b as FLOAT) });
            $engine.register_fn($name, |a: INT, b: FLOAT| -> FLOAT { ($f)(a as FLOAT, b) });
            $engine.register_fn($name, |a: FLOAT, b: INT| -> FLOAT { ($f)(a, b as FLOAT) });
        )*
    };
}

pub(crate) fn register_math(engine: &mut Engine) {
    register_unary!(engine,
        "sin" => FLOAT::sin,
        "cos" => FLOAT::cos,
        "tan" => FLOAT::tan,
        "asin" => FLOAT::asin,
        "acos" => FLOAT::acos,
        "atan" => FLOAT::atan,
        "sinh" => FLOAT::sinh,
        "cosh" => FLOAT::cosh,
        "tanh" => FLOAT::tanh,
        "sqrt" => FLOAT::sqrt,
        "exp" => FLOAT::exp,
        "ln" => FLOAT::ln,
        "log10" => FLOAT::log10,
        "log2" => FLOAT::log2,
        "fabs" => FLOAT::abs,
        "floor" => FLOAT::floor,
        "ceil" => FLOAT::ceil,
        "trunc" => FLOAT::trunc,
        "degrees" => FLOAT::to_degrees,
        "radians" => FLOAT::to_radians,
    );
    register_binary!(engine,
        "atan2" => FLOAT::atan2,
        "pow" => FLOAT::powf,
        "hypot" => FLOAT::hypot,
        "fmod" => |a: FLOAT, b: FLOAT| a % b,
    );

    engine.register_fn("pi", || std::f64::consts::PI);
    engine.register_fn("e", || std::f64::consts::E);
    engine.register_fn("tau", || std::f64::consts::TAU);
    engine.register_fn("inf", || FLOAT::INFINITY);
    engine.register_fn("nan", || FLOAT::NAN);
}

pub(crate) fn register_random(engine: &mut Engine, rng: Arc<Mutex<StdRng>>) {
    {
        let rng = rng.clone();
        engine.register_fn("random", move || -> FLOAT { rng.lock().r#gen::<FLOAT>() });
    }
    {
        let rng = rng.clone();
        engine.register_fn("uniform", move |a: FLOAT, b: FLOAT| -> FLOAT {
            a + (b - a) * rng.lock().r#gen::<FLOAT>()
        });
    }
    {
        let rng = rng.clone();
        engine.register_fn("uniform", move |a: INT, b: INT| -> FLOAT {
            let (a, b) = (a as FLOAT, b as FLOAT);
            a + (b - a) * rng.lock().r#gen::<FLOAT>()
        });
    }
    {
        let rng = rng.clone();
        engine.register_fn("randint", move |a: INT, b: INT| -> Fallible<INT> {
            if a > b {
                return Err(format!("randint: empty range {}..={}", a, b).into());
            }
            Ok(rng.lock().gen_range(a..=b))
        });
    }
    {
        let rng = rng.clone();
        engine.register_fn("gauss", move |mu: FLOAT, sigma: FLOAT| -> Fallible<FLOAT> {
            let normal = Normal::new(mu, sigma).map_err(|e| format!("gauss: {}", e))?;
            Ok(normal.sample(&mut *rng.lock()))
        });
    }
    {
        let rng = rng.clone();
        engine.register_fn("gauss", move |mu: INT, sigma: INT| -> Fallible<FLOAT> {
            let normal = Normal::new(mu as FLOAT, sigma as FLOAT)
                .map_err(|e| format!("gauss: {}", e))?;
            Ok(normal.sample(&mut *rng.lock()))
        });
    }
    {
        let rng = rng.clone();
        engine.register_fn("choice", move |items: Array| -> Fallible<Dynamic> {
            if items.is_empty() {
                return Err("choice: empty array".into());
            }
            let index = rng.lock().gen_range(0..items.len());
            Ok(items[index].clone())
        });
    }
    engine.register_fn("seed", move |seed: INT| {
        *rng.lock() = StdRng::seed_from_u64(seed as u64);
    });
}

pub(crate) fn register_time(engine: &mut Engine, clock: Arc<dyn Clock>, started: Instant) {
    engine.register_fn("now", move || -> Map {
        let now = clock.now();
        let mut map = Map::new();
        map.insert("sec".into(), Dynamic::from(now.sec as INT));
        map.insert("nanosec".into(), Dynamic::from(now.nanosec as INT));
        map
    });
    engine.register_fn("time", || -> FLOAT {
        SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0)
    });
    engine.register_fn("time_ns", || -> INT {
        SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_nanos() as INT)
            .unwrap_or(0)
    });
    engine.register_fn("monotonic", move || -> FLOAT {
        started.elapsed().as_secs_f64()
    });
}
