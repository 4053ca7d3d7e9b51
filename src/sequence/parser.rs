use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use crate::instructions::{ApccInstruction, AppmInstruction, Instruction};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("step {0}: {1}")]
    Step(usize, String),
}

/// A night's worth of instructions, in execution order.
#[derive(Debug, Clone)]
pub struct Sequence {
    #[allow(dead_code)]
    pub variables: HashMap<String, serde_yaml::Value>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone)]
pub struct Step {
    pub time: Option<TimeExpr>,
    pub on_fail: OnFail,
    pub instruction: Instruction,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum OnFail {
    #[default]
    Abort,
    Continue,
}

#[derive(Debug, Clone)]
pub enum TimeExpr {
    Relative(Duration),
    Absolute(DateTime<Utc>),
}

impl TimeExpr {
    pub fn resolve(&self, start: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            TimeExpr::Relative(d) => start + *d,
            TimeExpr::Absolute(dt) => *dt,
        }
    }
}

impl fmt::Display for TimeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeExpr::Relative(d) => {
                let (sign, d) = if *d < Duration::zero() { ('-', -*d) } else { ('+', *d) };
                write!(f, "T{sign}{}", humantime::format_duration(d.to_std().unwrap_or_default()))
            }
            TimeExpr::Absolute(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%SZ")),
        }
    }
}

impl Sequence {
    pub fn from_str(yaml: &str) -> Result<Self, ParseError> {
        let root: serde_yaml::Value = serde_yaml::from_str(yaml)?;

        let variables: HashMap<String, serde_yaml::Value> = root
            .get("variables")
            .map(|v| serde_yaml::from_value(v.clone()))
            .transpose()?
            .unwrap_or_default();

        let steps = root
            .get("steps")
            .and_then(|v| v.as_sequence())
            .ok_or_else(|| ParseError::Step(0, "missing 'steps'".into()))?
            .iter()
            .enumerate()
            .map(|(i, v)| parse_step(i, v, &variables))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Sequence { variables, steps })
    }
}

fn parse_step(
    i: usize,
    value: &serde_yaml::Value,
    vars: &HashMap<String, serde_yaml::Value>,
) -> Result<Step, ParseError> {
    let err = |msg: &str| ParseError::Step(i, msg.into());
    let map = value.as_mapping().ok_or_else(|| err("expected mapping"))?;

    let time = map
        .get("time")
        .map(|v| resolve_value(v, vars))
        .and_then(|v| v.as_str().map(String::from))
        .map(parse_time)
        .transpose()
        .map_err(|e| err(&e))?;

    let on_fail = map
        .get("on_fail")
        .map(|v| serde_yaml::from_value(resolve_value(v, vars)))
        .transpose()
        .map_err(|e| err(&e.to_string()))?
        .unwrap_or_default();

    // The instruction key is whatever isn't a step-level field.
    let (namespace, value) = map
        .iter()
        .find(|(k, _)| !matches!(k.as_str(), Some("time") | Some("on_fail")))
        .ok_or_else(|| err("no instruction found"))?;

    let namespace = namespace
        .as_str()
        .ok_or_else(|| err("instruction namespace must be a string"))?;
    let value = resolve_value(value, vars);

    let instruction = match namespace {
        "appm" => Instruction::Appm(
            serde_yaml::from_value::<AppmInstruction>(value).map_err(|e| err(&e.to_string()))?,
        ),
        "apcc" => Instruction::Apcc(
            serde_yaml::from_value::<ApccInstruction>(value).map_err(|e| err(&e.to_string()))?,
        ),
        _ => return Err(err(&format!("unknown namespace: {}", namespace))),
    };

    Ok(Step { time, on_fail, instruction })
}

fn parse_time(s: String) -> Result<TimeExpr, String> {
    let s = s.trim();

    // Relative: T+10s, T-5m
    if s.to_lowercase().starts_with('t') {
        let rest = &s[1..];
        let (neg, rest) = match rest.strip_prefix('-') {
            Some(r) => (true, r),
            None => (false, rest.strip_prefix('+').unwrap_or(rest)),
        };
        let dur = parse_duration(rest)?;
        return Ok(TimeExpr::Relative(if neg { -dur } else { dur }));
    }

    // Absolute with offset: 2026-01-12T10:00:00Z - 10s
    if let Some(idx) = s.rfind(['+', '-']) {
        if idx > 10 {
            if let Ok(base) = DateTime::parse_from_rfc3339(s[..idx].trim()) {
                let offset = &s[idx..];
                let (neg, rest) = match offset.strip_prefix('-') {
                    Some(r) => (true, r),
                    None => (false, offset.strip_prefix('+').unwrap_or(offset)),
                };
                let dur = parse_duration(rest)?;
                return Ok(TimeExpr::Absolute(
                    base.with_timezone(&Utc) + if neg { -dur } else { dur },
                ));
            }
        }
    }

    // Plain absolute
    DateTime::parse_from_rfc3339(s)
        .map(|dt| TimeExpr::Absolute(dt.with_timezone(&Utc)))
        .map_err(|e| e.to_string())
}

fn parse_duration(s: &str) -> Result<Duration, String> {
    humantime::parse_duration(s.trim())
        .map_err(|e| e.to_string())
        .and_then(|d| Duration::from_std(d).map_err(|e| e.to_string()))
}

fn resolve_value(
    value: &serde_yaml::Value,
    vars: &HashMap<String, serde_yaml::Value>,
) -> serde_yaml::Value {
    match value {
        serde_yaml::Value::String(s) => {
            // Direct reference: "$var"
            let t = s.trim();
            if t.starts_with('$') && !t.contains(' ') {
                if let Some(v) = vars.get(&t[1..]) {
                    return v.clone();
                }
            }
            // Inline substitution
            let mut result = s.clone();
            for (name, val) in vars {
                let pattern = format!("${}", name);
                if let Some(rep) = simple_to_string(val) {
                    result = result.replace(&pattern, &rep);
                }
            }
            serde_yaml::Value::String(result)
        }
        serde_yaml::Value::Mapping(m) => serde_yaml::Value::Mapping(
            m.iter()
                .map(|(k, v)| (k.clone(), resolve_value(v, vars)))
                .collect(),
        ),
        serde_yaml::Value::Sequence(s) => {
            serde_yaml::Value::Sequence(s.iter().map(|v| resolve_value(v, vars)).collect())
        }
        other => other.clone(),
    }
}

fn simple_to_string(v: &serde_yaml::Value) -> Option<String> {
    match v {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apcc::commands::ParkPosition;
    use chrono::TimeZone;

    #[test]
    fn parses_a_full_sequence() {
        let yaml = r#"
steps:
  - apcc:
      action: start
  - time: T+5m
    appm:
      action: create_dec_arc_model
      target:
        ra_hours: 5.59
        dec_deg: -5.39
      do_not_exit: true
  - time: 2026-01-12T10:00:00Z
    on_fail: continue
    apcc:
      action: park
      position: park3
"#;
        let seq = Sequence::from_str(yaml).unwrap();
        assert_eq!(seq.steps.len(), 3);

        assert!(seq.steps[0].time.is_none());
        assert_eq!(seq.steps[0].instruction.name(), "apcc.start");

        let step = &seq.steps[1];
        assert_eq!(step.instruction.name(), "appm.create_dec_arc_model");
        match &step.time {
            Some(TimeExpr::Relative(d)) => assert_eq!(*d, Duration::minutes(5)),
            other => panic!("unexpected time: {other:?}"),
        }
        match &step.instruction {
            Instruction::Appm(AppmInstruction::CreateDecArcModel(i)) => {
                assert_eq!(i.target.ra_hours, 5.59);
                assert!(i.do_not_exit);
                assert!(!i.full_arc);
            }
            other => panic!("unexpected instruction: {other:?}"),
        }

        let step = &seq.steps[2];
        assert_eq!(step.on_fail, OnFail::Continue);
        match &step.instruction {
            Instruction::Apcc(ApccInstruction::Park(p)) => {
                assert_eq!(p.position, ParkPosition::Park3)
            }
            other => panic!("unexpected instruction: {other:?}"),
        }
    }

    #[test]
    fn variables_substitute_into_instructions() {
        let yaml = r#"
variables:
  dec: -5.39
steps:
  - appm:
      action: create_dec_arc_model
      target:
        ra_hours: 5.59
        dec_deg: $dec
"#;
        let seq = Sequence::from_str(yaml).unwrap();
        match &seq.steps[0].instruction {
            Instruction::Appm(AppmInstruction::CreateDecArcModel(i)) => {
                assert_eq!(i.target.dec_deg, -5.39)
            }
            other => panic!("unexpected instruction: {other:?}"),
        }
    }

    #[test]
    fn absolute_time_with_offset() {
        let yaml = "steps:\n  - time: 2026-01-12T10:00:00Z - 10s\n    apcc:\n      action: start\n";
        let seq = Sequence::from_str(yaml).unwrap();
        match &seq.steps[0].time {
            Some(TimeExpr::Absolute(t)) => {
                assert_eq!(*t, Utc.with_ymd_and_hms(2026, 1, 12, 9, 59, 50).unwrap())
            }
            other => panic!("unexpected time: {other:?}"),
        }
    }

    #[test]
    fn time_expressions_display_like_the_sequence_grammar() {
        assert_eq!(TimeExpr::Relative(Duration::minutes(5)).to_string(), "T+5m");
        assert_eq!(TimeExpr::Relative(-Duration::seconds(10)).to_string(), "T-10s");
        let t = Utc.with_ymd_and_hms(2026, 1, 12, 10, 0, 0).unwrap();
        assert_eq!(TimeExpr::Absolute(t).to_string(), "2026-01-12T10:00:00Z");
    }

    #[test]
    fn unknown_namespace_is_rejected() {
        let yaml = "steps:\n  - rotator:\n      action: park\n";
        let e = Sequence::from_str(yaml).unwrap_err();
        assert!(e.to_string().contains("unknown namespace"));
    }

    #[test]
    fn missing_steps_is_rejected() {
        assert!(Sequence::from_str("variables: {}\n").is_err());
    }
}
