//! Companies (prefix `co`).

use clean_model::{
    CaseFold, CharClass, FieldRule, FieldType, Row, RowKey, RuleSet, RuleSpecError, Value,
};
use clean_transform::{AddMissingFields, PreTransform};

use crate::entity::EntityDescriptor;

pub const NAME: &str = "companies";
pub const PREFIX: &str = "co";

/// Country assumed for head offices when the source omits it.
pub const DEFAULT_COUNTRY: &str = "FRANCE";

pub fn field_rules() -> Result<RuleSet, RuleSpecError> {
    RuleSet::builder(NAME, PREFIX)
        .field("co_id", FieldRule::integer().primary_key().min_value(1))
        .field(
            "co_denomination",
            FieldRule::string()
                .required()
                .unique()
                .max_length(100)
                .with_default(""),
        )
        // SIREN: 9-digit French business register number.
        .field(
            "co_siren",
            FieldRule::string()
                .max_length(9)
                .allowed_chars(CharClass::new("0-9")?)
                .unique(),
        )
        .field(
            "co_head_office_address",
            FieldRule::string().max_length(255).with_default(""),
        )
        .field(
            "co_head_office_city",
            FieldRule::string().max_length(100).with_default(""),
        )
        .field(
            "co_head_office_country",
            FieldRule::string()
                .required()
                .case(CaseFold::Upper)
                .max_length(60)
                .with_default(DEFAULT_COUNTRY),
        )
        .field("co_active", FieldRule::boolean().with_default(true))
        .field("co_created_on", FieldRule::date())
        .field(
            "transports",
            FieldRule::array(FieldType::Integer).with_default(Vec::<i64>::new()),
        )
        .build()
}

pub fn key_of(row: &Row) -> Option<RowKey> {
    RowKey::from_values([row.get("co_id").unwrap_or(&Value::Null)])
}

pub fn pre_transforms() -> Vec<Box<dyn PreTransform>> {
    vec![Box::new(
        AddMissingFields::new().with_field("co_head_office_country", DEFAULT_COUNTRY),
    )]
}

pub fn descriptor() -> EntityDescriptor {
    EntityDescriptor {
        name: NAME,
        prefix: PREFIX,
        field_rules,
        initialize_output_info: RuleSet::initialize_output_info,
        key_of,
        pre_transforms,
    }
}
