//! Build-time errors for the network model.
//!
//! Every problem detected while turning input tables into a [`Network`](crate::Network)
//! is reported here, before any solver sees the model. Referencing an arc that
//! the topology does not contain is rejected instead of being defaulted, so a
//! typo in a parameter table cannot silently vanish from the formulation.

use thiserror::Error;

/// Errors raised while building or querying a network model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NetworkError {
    /// A parameter table names an arc that is absent from the topology.
    #[error("{table}: arc {origin} -[{mode}]-> {destination} is not in the topology")]
    InvalidTopologyReference {
        table: String,
        origin: String,
        mode: String,
        destination: String,
    },

    /// A table references a location that was never declared.
    #[error("{table}: unknown location '{name}'")]
    UnknownLocation { table: String, name: String },

    /// A table references a transport mode that was never declared.
    #[error("{table}: unknown transport mode '{name}'")]
    UnknownMode { table: String, name: String },

    /// A table references a time period that was never declared.
    #[error("{table}: unknown time period '{name}'")]
    UnknownPeriod { table: String, name: String },

    /// The same location name was declared more than once.
    #[error("location '{name}' is declared more than once")]
    DuplicateLocation { name: String },

    /// A name appears twice in an ordered collection (periods or modes).
    #[error("duplicate {kind} '{name}'")]
    DuplicateName { kind: &'static str, name: String },

    /// A parameter only defined for one role was supplied for another.
    #[error("{table}: location '{name}' is a {role}, expected a {expected}")]
    RoleMismatch {
        table: String,
        name: String,
        role: String,
        expected: String,
    },

    /// A parameter value is negative or not finite.
    #[error("{table}[{key}]: invalid value {value}")]
    InvalidParameter {
        table: String,
        key: String,
        value: f64,
    },

    /// Demand was supplied in the wrong form for the configured demand model.
    #[error("{table} cannot be used when demand is {model}")]
    DemandModelMismatch { table: String, model: &'static str },

    /// The planning horizon has no periods.
    #[error("the planning horizon must contain at least one time period")]
    EmptyHorizon,
}

/// Convenience alias for results carrying a [`NetworkError`].
pub type NetworkResult<T> = Result<T, NetworkError>;
