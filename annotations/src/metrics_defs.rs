//! Metrics definitions for annotation processing.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Counter,
}

#[derive(Debug, Clone, Copy)]
pub struct MetricDef {
    pub name: &'static str,
    pub metric_type: MetricType,
    pub description: &'static str,
}

macro_rules! counter {
    ($def:expr $(, $label:literal => $value:expr)* $(,)?) => {
        metrics::counter!($def.name $(, $label => $value)*)
    };
}

pub(crate) use counter;

pub const ANNOTATION_CONFLICT: MetricDef = MetricDef {
    name: "annotations.conflict",
    metric_type: MetricType::Counter,
    description: "Queries of an annotation declared with distinct values by distinct resources",
};

pub const ANNOTATION_INVALID_VALUE: MetricDef = MetricDef {
    name: "annotations.invalid_value",
    metric_type: MetricType::Counter,
    description: "Annotation values rejected by a validator and replaced by the default",
};

pub const BUILDER_REJECTED: MetricDef = MetricDef {
    name: "annotations.builder.rejected",
    metric_type: MetricType::Counter,
    description: "Features disabled because of an unsupported or unusable annotation",
};

pub const BLUE_GREEN_ENDPOINT_REMOVED: MetricDef = MetricDef {
    name: "bluegreen.endpoint.removed",
    metric_type: MetricType::Counter,
    description: "Endpoints removed from blue/green balance because their pod could not be resolved",
};

pub const BLUE_GREEN_EXPRESSION_REJECTED: MetricDef = MetricDef {
    name: "bluegreen.expression.rejected",
    metric_type: MetricType::Counter,
    description: "Blue/green balance expressions rejected as a whole",
};

pub const ALL_METRICS: &[MetricDef] = &[
    ANNOTATION_CONFLICT,
    ANNOTATION_INVALID_VALUE,
    BUILDER_REJECTED,
    BLUE_GREEN_ENDPOINT_REMOVED,
    BLUE_GREEN_EXPRESSION_REJECTED,
];

/// Registers the description of every metric with the installed recorder.
pub fn describe() {
    for def in ALL_METRICS {
        match def.metric_type {
            MetricType::Counter => metrics::describe_counter!(def.name, def.description),
        }
    }
}
