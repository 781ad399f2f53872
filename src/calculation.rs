//! # Calculation Requests
//!
//! The petrophysical calculations a structure can be sent to, the log curves each one
//! needs, their editable parameters, and the typed request and response bodies of the
//! calculation service.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

/// Errors of the calculation surface.
#[derive(Error, Debug)]
pub enum CalculationError {
    #[error("Unknown calculation type: {0}")]
    UnknownCalculation(String),

    #[error("Missing required columns for {calculation}: {}", missing.join(", "))]
    MissingColumns {
        calculation: CalculationType,
        missing: Vec<String>,
    },

    /// The service answered with `status: error`
    #[error("Calculation service error: {0}")]
    Backend(String),
}

/// Supported calculations.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationType {
    /// Volume of shale from gamma ray
    Vsh,
    Porosity,
    /// Gamma-ray shale analysis
    Gsa,
    RgbeRpbe,
    RtR0,
    Swgrad,
    DnsDnsv,
    /// Water saturation
    Sw,
    /// Apparent water resistivity
    Rwa,
    /// Interval normalization of a log curve
    Normalization,
}

impl CalculationType {
    pub const ALL: [CalculationType; 10] = [
        Self::Vsh,
        Self::Porosity,
        Self::Gsa,
        Self::RgbeRpbe,
        Self::RtR0,
        Self::Swgrad,
        Self::DnsDnsv,
        Self::Sw,
        Self::Rwa,
        Self::Normalization,
    ];

    /// Wire name of the calculation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Vsh => "vsh",
            Self::Porosity => "porosity",
            Self::Gsa => "gsa",
            Self::RgbeRpbe => "rgbe_rpbe",
            Self::RtR0 => "rt_r0",
            Self::Swgrad => "swgrad",
            Self::DnsDnsv => "dns_dnsv",
            Self::Sw => "sw",
            Self::Rwa => "rwa",
            Self::Normalization => "normalization",
        }
    }

    /// Log curves the calculation reads.
    pub const fn required_columns(&self) -> &'static [&'static str] {
        match self {
            Self::Vsh => &["GR"],
            Self::Porosity => &["NPHI", "RHOB"],
            Self::Gsa => &["GR", "RT", "NPHI", "RHOB"],
            Self::RgbeRpbe => &["DEPTH", "GR", "RT", "PHIE", "VSH"],
            Self::RtR0 => &["RT", "PHIE", "VSH"],
            Self::Swgrad => &["DEPTH", "RT", "PHIE", "VSH"],
            Self::DnsDnsv => &["RHOB", "NPHI", "VSH"],
            Self::Sw => &["RT", "PHIE"],
            Self::Rwa => &["RT", "PHIE", "VSH"],
            Self::Normalization => &["GR", "MARKER"],
        }
    }

    /// Checks that every required column is present. Names must match exactly.
    pub fn validate_requirements<S: AsRef<str>>(&self, columns: &[S]) -> Result<(), CalculationError> {
        let missing: Vec<String> = self
            .required_columns()
            .iter()
            .filter(|required| !columns.iter().any(|column| column.as_ref() == **required))
            .map(|required| required.to_string())
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        tracing::debug!(calculation = %self, missing = ?missing, "Calculation requirements not met");
        Err(CalculationError::MissingColumns {
            calculation: *self,
            missing,
        })
    }

    /// Editable parameters of the calculation, `None` when it has none.
    pub fn parameters(&self) -> Option<ParameterSet> {
        let (title, parameters) = match self {
            Self::Vsh => ("VSH Calculation Parameters", vec![
                ParameterSpec::float("GR_MA", 30, "GR Matrix Value", 0, 200),
                ParameterSpec::float("GR_SH", 120, "GR Shale Value", 0, 300),
                ParameterSpec::select("input_log", "GR", "Input Log", &["GR", "CGR", "SGR"]),
                ParameterSpec::text("output_log", "VSH_GR", "Output Log Name"),
            ]),
            Self::Porosity => ("Porosity Calculation Parameters", vec![
                ParameterSpec::select("PHIE_METHOD", "density", "Porosity Method", &["density", "neutron", "combined"]),
                ParameterSpec::float("RHO_MA", 2.65, "Matrix Density", 1.0, 4.0),
                ParameterSpec::float("RHO_FL", 1.0, "Fluid Density", 0.5, 2.0),
                ParameterSpec::float("NPHI_MA", 0.0, "Matrix Neutron", 0.0, 1.0),
            ]),
            Self::Gsa => ("GSA Calculation Parameters", vec![
                ParameterSpec::int("window_size", 50, "Window Size", 10, 200),
                ParameterSpec::int("overlap", 25, "Overlap", 5, 100),
                ParameterSpec::int("min_samples", 10, "Minimum Samples", 5, 50),
            ]),
            Self::Sw => ("Water Saturation Calculation Parameters", vec![
                ParameterSpec::float("rw", 0.1, "Water Resistivity", 0.001, 10),
                ParameterSpec::float("a", 1.0, "Archie's 'a'", 0.1, 10),
                ParameterSpec::float("m", 2.0, "Archie's 'm'", 1.0, 5.0),
                ParameterSpec::float("n", 2.0, "Archie's 'n'", 1.0, 5.0),
            ]),
            Self::Rwa => ("RWA Calculation Parameters", vec![
                ParameterSpec::select("method", "full", "RWA Method", &["full", "simple", "tar"]),
                ParameterSpec::float("cutoff_porosity", 0.08, "Cutoff Porosity", 0.01, 0.5),
                ParameterSpec::float("cutoff_vsh", 0.5, "Cutoff VSH", 0.0, 1.0),
            ]),
            Self::Normalization => ("Interval Normalization Parameters", vec![
                ParameterSpec::select("LOG_IN", "GR", "Input Log", &["GR", "CGR", "SGR", "NPHI", "RHOB"]),
                ParameterSpec::text("LOG_OUT", "GR_NORM", "Output Log Name"),
                ParameterSpec::float("LOW_REF", 40, "Low Reference", 0, 1000),
                ParameterSpec::float("HIGH_REF", 140, "High Reference", 0, 1000),
                ParameterSpec::int("LOW_IN", 3, "Low Percentile", 0, 50),
                ParameterSpec::int("HIGH_IN", 97, "High Percentile", 50, 100),
                ParameterSpec::float("CUTOFF_MIN", 0.0, "Cutoff Min", -1000, 1000),
                ParameterSpec::float("CUTOFF_MAX", 250.0, "Cutoff Max", -1000, 1000),
            ]),
            Self::RgbeRpbe | Self::RtR0 | Self::Swgrad | Self::DnsDnsv => return None,
        };
        Some(ParameterSet {
            title: title.to_owned(),
            parameters,
        })
    }
}

impl Display for CalculationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CalculationType {
    type Err = CalculationError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| CalculationError::UnknownCalculation(name.to_owned()))
    }
}

/// Input widget kind of a parameter.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    Float,
    Int,
    Select,
    Text,
}

/// One editable calculation parameter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParameterKind,
    /// Default value; whole-number float defaults stay JSON integers (`30`, not `30.0`)
    pub default: Value,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl ParameterSpec {
    fn new(name: &str, kind: ParameterKind, default: Value, label: &str) -> Self {
        Self {
            name: name.to_owned(),
            kind,
            default,
            label: label.to_owned(),
            min: None,
            max: None,
            options: Vec::new(),
        }
    }

    fn float<D, L, H>(name: &str, default: D, label: &str, min: L, max: H) -> Self
    where
        D: Into<Value>,
        L: Into<Value>,
        H: Into<Value>,
    {
        Self {
            min: Some(min.into()),
            max: Some(max.into()),
            ..Self::new(name, ParameterKind::Float, default.into(), label)
        }
    }

    fn int(name: &str, default: i64, label: &str, min: i64, max: i64) -> Self {
        Self {
            min: Some(Value::from(min)),
            max: Some(Value::from(max)),
            ..Self::new(name, ParameterKind::Int, Value::from(default), label)
        }
    }

    fn select(name: &str, default: &str, label: &str, options: &[&str]) -> Self {
        Self {
            options: options.iter().map(|option| option.to_string()).collect(),
            ..Self::new(name, ParameterKind::Select, Value::from(default), label)
        }
    }

    fn text(name: &str, default: &str, label: &str) -> Self {
        Self::new(name, ParameterKind::Text, Value::from(default), label)
    }
}

/// Parameter form of a calculation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    pub title: String,
    pub parameters: Vec<ParameterSpec>,
}

impl ParameterSet {
    /// Parameter values with every parameter at its default.
    pub fn defaults(&self) -> Map<String, Value> {
        self.parameters
            .iter()
            .map(|parameter| (parameter.name.to_owned(), parameter.default.clone()))
            .collect()
    }
}

/// Body of a calculation request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalculationRequest {
    pub calculation_type: CalculationType,
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub well_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure_context: Option<Value>,
}

impl CalculationRequest {
    /// A request carrying the calculation's default parameters.
    pub fn new(calculation_type: CalculationType) -> Self {
        Self {
            calculation_type,
            params: calculation_type
                .parameters()
                .map(|parameters| parameters.defaults())
                .unwrap_or_default(),
            well_name: None,
            structure_context: None,
        }
    }

    pub fn with_well(mut self, well_name: &str) -> Self {
        self.well_name = Some(well_name.to_owned());
        self
    }

    pub fn with_structure_context(mut self, context: Value) -> Self {
        self.structure_context = Some(context);
        self
    }
}

/// Payload of a calculation result: a `{data, layout}` chart figure.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculationOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub figure: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Payload of a parameters lookup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParametersOutput {
    pub calculation_type: CalculationType,
    pub parameters: ParameterSet,
}

/// Response of the calculation service, tagged by `status` on the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BackendResponse<T> {
    Success(T),
    Error { message: String },
}

impl<T: DeserializeOwned> BackendResponse<T> {
    /// Parses a response body.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl<T> BackendResponse<T> {
    pub fn into_result(self) -> Result<T, CalculationError> {
        match self {
            Self::Success(payload) => Ok(payload),
            Self::Error { message } => {
                tracing::warn!(message = %message, "Calculation service returned an error");
                Err(CalculationError::Backend(message))
            }
        }
    }
}
