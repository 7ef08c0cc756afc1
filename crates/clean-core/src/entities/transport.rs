//! Transport carriers (prefix `tra`).

use clean_model::{CharClass, FieldRule, FieldType, Row, RowKey, RuleSet, RuleSpecError, Value};

use crate::entity::{EntityDescriptor, no_pre_transforms};

pub const NAME: &str = "transport";
pub const PREFIX: &str = "tra";

pub fn field_rules() -> Result<RuleSet, RuleSpecError> {
    RuleSet::builder(NAME, PREFIX)
        .field("tra_id", FieldRule::integer().primary_key().min_value(1))
        .field(
            "tra_denomination",
            FieldRule::string()
                .required()
                .unique()
                .max_length(100)
                .forbidden_chars(CharClass::new("<>;{}")?)
                .with_default(""),
        )
        .field("contacts", id_list())
        .field("deliveries", id_list())
        .field("stock_import", id_list())
        .build()
}

fn id_list() -> FieldRule {
    FieldRule::array(FieldType::Integer).with_default(Vec::<i64>::new())
}

pub fn key_of(row: &Row) -> Option<RowKey> {
    RowKey::from_values([row.get("tra_id").unwrap_or(&Value::Null)])
}

pub fn descriptor() -> EntityDescriptor {
    EntityDescriptor {
        name: NAME,
        prefix: PREFIX,
        field_rules,
        initialize_output_info: RuleSet::initialize_output_info,
        key_of,
        pre_transforms: no_pre_transforms,
    }
}
