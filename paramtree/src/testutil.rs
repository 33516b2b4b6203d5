use mockall::mock;
use serde_json::json;

use crate::{
    descriptor::{MaxOccurs, ParameterDescriptor, ProcessDescriptor, RestrictionDescriptor},
    tree::ParamId,
    validate,
};

pub fn pid(s: &str) -> ParamId {
    ParamId::from(s)
}

mock! {
    pub Uploads {}

    impl validate::UploadStatus for Uploads {
        fn is_uploading(&self, id: &ParamId, index: usize) -> bool;
    }
}

/// A single mandatory integer parameter with a default.
pub fn count_descriptor() -> ProcessDescriptor {
    ProcessDescriptor {
        descriptors: vec![
            ParameterDescriptor::simple("count", "java.lang.Integer").with_default(json!("5")),
        ],
    }
}

/// An unbounded group of one string parameter.
pub fn group_descriptor() -> ProcessDescriptor {
    ProcessDescriptor {
        descriptors: vec![
            ParameterDescriptor::group(
                "g",
                vec![ParameterDescriptor::simple("x", "java.lang.String")],
            )
            .with_occurs(1, MaxOccurs::Unbounded),
        ],
    }
}

/// A representative mix of parameter kinds, including nesting.
pub fn mixed_descriptor() -> ProcessDescriptor {
    ProcessDescriptor {
        descriptors: vec![
            ParameterDescriptor::simple("ratio", "java.lang.Double")
                .with_default(json!("0.5"))
                .with_restriction(RestrictionDescriptor {
                    min_value: Some(json!(0)),
                    max_value: Some(json!(1)),
                    valid_values: None,
                }),
            ParameterDescriptor::simple("tags", "java.lang.String[]")
                .with_occurs(0, MaxOccurs::Unbounded),
            ParameterDescriptor::simple("mode", "java.lang.String")
                .with_default(json!("fast"))
                .with_restriction(RestrictionDescriptor {
                    valid_values: Some(vec![json!("fast"), json!("exact")]),
                    ..Default::default()
                }),
            ParameterDescriptor::group(
                "layers",
                vec![
                    ParameterDescriptor::simple("name", "java.lang.String"),
                    ParameterDescriptor::group(
                        "bands",
                        vec![ParameterDescriptor::simple("index", "int")],
                    )
                    .with_occurs(0, MaxOccurs::Unbounded),
                ],
            )
            .with_occurs(1, MaxOccurs::Bounded(3)),
        ],
    }
}
