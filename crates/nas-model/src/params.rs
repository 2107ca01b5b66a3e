//! PARAM cards and the key → value-type → default table

use crate::entity::BulkEntry;
use crate::error::{ModelError, Result};
use crate::field::{BdfCard, Field};
use serde::{Deserialize, Serialize};

/// Value shape a PARAM key expects
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Int(i32),
    Float(f64),
    Str(&'static str),
    /// Two reals, e.g. a complex scale factor
    FloatPair(f64, f64),
}

/// Typed entry of the PARAM table
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub key: &'static str,
    pub default: ParamValue,
    /// Allowed string values, empty when unrestricted
    pub allowed: &'static [&'static str],
}

const fn spec(key: &'static str, default: ParamValue) -> ParamSpec {
    ParamSpec {
        key,
        default,
        allowed: &[],
    }
}

const PAIR_ZERO: ParamValue = ParamValue::FloatPair(0.0, 0.0);
const PAIR_ONE: ParamValue = ParamValue::FloatPair(1.0, 0.0);

/// Keys with a known value type
pub const PARAM_TABLE: &[ParamSpec] = &[
    spec("ACOUT", ParamValue::Str("PEAK")),
    spec("ACOWEAK", ParamValue::Str("NO")),
    spec("ACSYM", ParamValue::Str("YES")),
    spec("ADJMETH", ParamValue::Int(0)),
    spec("ADPCON", ParamValue::Float(1.0)),
    spec("ADSDISC", ParamValue::Float(1e-8)),
    spec("ADSTAT", ParamValue::Str("YES")),
    spec("AESMAXIT", ParamValue::Int(15)),
    ParamSpec {
        key: "AESMETH",
        default: ParamValue::Str("SELECT"),
        allowed: &["SELECT", "AUTO", "DIRECT", "RITZ", "ITER"],
    },
    spec("AESTOL", ParamValue::Float(1e-10)),
    spec("POST", ParamValue::Int(1)),
    spec("ALPHA1", PAIR_ZERO),
    spec("ALPHA2", PAIR_ZERO),
    spec("ALPHA1FL", PAIR_ZERO),
    spec("ALPHA2FL", PAIR_ZERO),
    spec("CB1", PAIR_ONE),
    spec("CB2", PAIR_ONE),
    spec("CK1", PAIR_ONE),
    spec("CK2", PAIR_ONE),
    spec("CK3", PAIR_ONE),
    spec("CK41", PAIR_ONE),
    spec("CK42", PAIR_ONE),
    spec("CM1", PAIR_ONE),
    spec("CM2", PAIR_ONE),
    spec("CP1", PAIR_ONE),
    spec("CP2", PAIR_ONE),
];

/// Table entry for a key
pub fn param_spec(key: &str) -> Option<&'static ParamSpec> {
    PARAM_TABLE.iter().find(|s| s.key == key)
}

/// PARAM: a named solver parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub key: String,
    /// One value, or two for pair-valued and untyped keys
    pub values: Vec<Field>,
    #[serde(default)]
    pub comment: String,
}

impl Param {
    pub fn add_card(card: &BdfCard, comment: &str) -> Result<Self> {
        let key = card.string(1, "key")?;
        let spec = param_spec(&key);
        let max = match spec.map(|s| s.default) {
            Some(ParamValue::FloatPair(..)) | None => 4,
            Some(_) => 3,
        };
        card.ensure_max_len(max)?;
        let values = match spec {
            Some(spec) => typed_values(card, spec)?,
            None => {
                let mut values = vec![card.integer_double_string_or_blank(2, "value1")?];
                let value2 = card.integer_double_string_or_blank(3, "value2")?;
                if !value2.is_blank() {
                    values.push(value2);
                }
                values
            }
        };
        Ok(Param {
            key,
            values,
            comment: comment.to_string(),
        })
    }

    /// Replace the values, checked against the key's table entry
    pub fn update_values(&mut self, values: Vec<Field>) -> Result<()> {
        let mut fields = vec![Field::text("PARAM"), Field::text(&self.key)];
        fields.extend(values);
        let updated = Param::add_card(&BdfCard::new(fields), &self.comment)?;
        self.values = updated.values;
        Ok(())
    }

    /// First value as an integer, if it is one
    pub fn int_value(&self) -> Option<i32> {
        match self.values.first() {
            Some(Field::Int(v)) => Some(*v),
            _ => None,
        }
    }
}

fn typed_values(card: &BdfCard, spec: &ParamSpec) -> Result<Vec<Field>> {
    Ok(match spec.default {
        ParamValue::Int(d) => vec![Field::Int(card.integer_or_blank(2, "value", d)?)],
        ParamValue::Float(d) => vec![Field::Float(card.double_or_blank(2, "value", d)?)],
        ParamValue::Str(d) => {
            let value = card.string_or_blank(2, "value", d)?;
            if !spec.allowed.is_empty() && !spec.allowed.contains(&value.as_str()) {
                return Err(ModelError::field(
                    "PARAM",
                    2,
                    spec.key,
                    format!("{value:?} is not one of {:?}", spec.allowed),
                ));
            }
            vec![Field::Text(value)]
        }
        ParamValue::FloatPair(d1, d2) => vec![
            Field::Float(card.double_or_blank(2, "value1", d1)?),
            Field::Float(card.double_or_blank(3, "value2", d2)?),
        ],
    })
}

impl BulkEntry for Param {
    fn card_type(&self) -> &str {
        "PARAM"
    }

    /// Parameters are keyed by name
    fn id(&self) -> i32 {
        0
    }

    fn comment(&self) -> &str {
        &self.comment
    }

    fn raw_fields(&self) -> Vec<Field> {
        let mut fields = vec![Field::text("PARAM"), Field::text(&self.key)];
        fields.extend(self.values.iter().cloned());
        fields
    }

    fn verify(&self) -> Result<()> {
        if self.key.is_empty() || self.values.is_empty() {
            return Err(ModelError::verify("PARAM", 0, format!("key {:?} has no value", self.key)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_key_takes_default() {
        let card = BdfCard::from_tokens(&["PARAM", "POST"]);
        let param = Param::add_card(&card, "").expect("PARAM POST");
        assert_eq!(param.int_value(), Some(1));
        param.verify().expect("PARAM should verify");
    }

    #[test]
    fn pair_key_has_two_values() {
        let card = BdfCard::from_tokens(&["PARAM", "CB1", "2.0"]);
        let param = Param::add_card(&card, "").expect("PARAM CB1");
        assert_eq!(param.values, vec![Field::Float(2.0), Field::Float(0.0)]);
    }

    #[test]
    fn restricted_string_values() {
        let card = BdfCard::from_tokens(&["PARAM", "AESMETH", "NEWTON"]);
        assert!(Param::add_card(&card, "").is_err());
        let card = BdfCard::from_tokens(&["PARAM", "AESMETH", "auto"]);
        let param = Param::add_card(&card, "").expect("PARAM AESMETH");
        assert_eq!(param.values, vec![Field::text("AUTO")]);
    }

    #[test]
    fn single_value_keys_reject_a_fourth_field() {
        let card = BdfCard::from_tokens(&["PARAM", "POST", "-1", "2"]);
        assert!(Param::add_card(&card, "").is_err());
    }

    #[test]
    fn untyped_key_and_update() {
        let card = BdfCard::from_tokens(&["PARAM", "WTMASS", "0.00259"]);
        let mut param = Param::add_card(&card, "").expect("PARAM WTMASS");
        assert_eq!(param.values, vec![Field::Float(0.00259)]);
        param.update_values(vec![Field::Float(1.0)]).expect("update");
        assert_eq!(param.values, vec![Field::Float(1.0)]);
    }
}
