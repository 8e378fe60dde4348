//! Aggregate accumulators (§4.5 stage 4, §9 Design Notes: "accumulators are
//! fed once per contributing row and read afterwards, possibly more than
//! once").

use lsql_core::{Error, Result, Value};

/// Running state for one lifted aggregate call. Built fresh per group, fed
/// one row at a time, then read via [`Accumulator::value`] — which may be
/// called any number of times after the last feed (e.g. once for the
/// projection and again for `HAVING`).
pub enum Accumulator {
    Count(i64),
    Sum { total: f64, all_int: bool, any: bool },
    Min(Option<Value>),
    Max(Option<Value>),
    Avg { total: f64, count: i64 },
}

impl Accumulator {
    pub fn new(name: &str) -> Result<Self> {
        match name {
            "count" => Ok(Accumulator::Count(0)),
            "sum" => Ok(Accumulator::Sum {
                total: 0.0,
                all_int: true,
                any: false,
            }),
            "min" => Ok(Accumulator::Min(None)),
            "max" => Ok(Accumulator::Max(None)),
            "avg" => Ok(Accumulator::Avg { total: 0.0, count: 0 }),
            other => Err(Error::UnknownFunction {
                name: other.to_string(),
            }),
        }
    }

    /// Feeds one row's argument value through. Every aggregate skips `NULL`
    /// (§6.5) — including `count`, whose `count(*)` spelling the parser
    /// rewrites to a literal `1` argument, so it never actually sees one.
    pub fn feed(&mut self, v: &Value) {
        if v.is_null() {
            return;
        }
        match self {
            Accumulator::Count(n) => *n += 1,
            Accumulator::Sum { total, all_int, any } => {
                if let Some(f) = v.as_f64() {
                    *total += f;
                    *any = true;
                    if !matches!(v, Value::Int(_)) {
                        *all_int = false;
                    }
                }
            }
            Accumulator::Min(cur) => {
                if cur.as_ref().map(|c| v < c).unwrap_or(true) {
                    *cur = Some(v.clone());
                }
            }
            Accumulator::Max(cur) => {
                if cur.as_ref().map(|c| v > c).unwrap_or(true) {
                    *cur = Some(v.clone());
                }
            }
            Accumulator::Avg { total, count } => {
                if let Some(f) = v.as_f64() {
                    *total += f;
                    *count += 1;
                }
            }
        }
    }

    /// The aggregate's current value. Never fed (an empty group): `count`
    /// and `sum` read as zero, `min`/`max`/`avg` read as `NULL`, matching
    /// standard SQL's aggregate-over-empty-set behavior.
    pub fn value(&self) -> Value {
        match self {
            Accumulator::Count(n) => Value::Int(*n),
            Accumulator::Sum { total, all_int, any } => {
                if !any {
                    Value::Int(0)
                } else if *all_int && total.fract() == 0.0 {
                    Value::Int(*total as i64)
                } else {
                    Value::Float(*total)
                }
            }
            Accumulator::Min(cur) => cur.clone().unwrap_or(Value::Null),
            Accumulator::Max(cur) => cur.clone().unwrap_or(Value::Null),
            Accumulator::Avg { total, count } => {
                if *count == 0 {
                    Value::Null
                } else {
                    Value::Float(total / *count as f64)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_skips_nulls() {
        let mut acc = Accumulator::new("count").unwrap();
        acc.feed(&Value::Int(1));
        acc.feed(&Value::Null);
        acc.feed(&Value::Int(1));
        assert_eq!(acc.value(), Value::Int(2));
    }

    #[test]
    fn sum_stays_integral_when_every_input_is_integral() {
        let mut acc = Accumulator::new("sum").unwrap();
        acc.feed(&Value::Int(2));
        acc.feed(&Value::Int(3));
        assert_eq!(acc.value(), Value::Int(5));
    }

    #[test]
    fn sum_becomes_float_once_a_float_is_fed() {
        let mut acc = Accumulator::new("sum").unwrap();
        acc.feed(&Value::Int(2));
        acc.feed(&Value::Float(0.5));
        assert_eq!(acc.value(), Value::Float(2.5));
    }

    #[test]
    fn empty_sum_is_zero_but_empty_min_is_null() {
        assert_eq!(Accumulator::new("sum").unwrap().value(), Value::Int(0));
        assert_eq!(Accumulator::new("min").unwrap().value(), Value::Null);
        assert_eq!(Accumulator::new("avg").unwrap().value(), Value::Null);
    }

    #[test]
    fn min_and_max_track_extremes() {
        let mut min = Accumulator::new("min").unwrap();
        let mut max = Accumulator::new("max").unwrap();
        for v in [Value::Int(5), Value::Int(1), Value::Int(3)] {
            min.feed(&v);
            max.feed(&v);
        }
        assert_eq!(min.value(), Value::Int(1));
        assert_eq!(max.value(), Value::Int(3));
    }

    #[test]
    fn avg_divides_by_the_count_of_non_null_inputs() {
        let mut acc = Accumulator::new("avg").unwrap();
        acc.feed(&Value::Int(2));
        acc.feed(&Value::Null);
        acc.feed(&Value::Int(4));
        assert_eq!(acc.value(), Value::Float(3.0));
    }

    #[test]
    fn unknown_aggregate_name_is_an_error() {
        assert!(Accumulator::new("median").is_err());
    }
}
