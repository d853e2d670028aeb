/// Core data structures for contract records
///
/// This module defines the typed contract record produced by the dataset
/// parse step and the categorical columns the filters and option lists
/// operate on.
use chrono::NaiveDate;

/// One row of the contract dataset.
///
/// Every field is optional: empty or unparseable cells become `None`,
/// never a zero or placeholder value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContractRecord {
    pub entity_name: Option<String>,          // "ALCALDIA DE BUCARAMANGA"
    pub city: Option<String>,                 // "Bucaramanga"
    pub contracting_modality: Option<String>, // "Contratación directa"
    pub contract_type: Option<String>,        // "Prestación de servicios"
    pub contract_status: Option<String>,      // "En ejecución"
    pub awarded_provider: Option<String>,
    pub contract_object: Option<String>, // free-text description, the searched field
    pub contract_value: Option<f64>,
    pub paid_value: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub process_reference: Option<String>, // "CO1.PCCNTR.1234567"
    pub process_url: Option<String>,       // raw value or serialized {"url": ...} mapping
}

impl ContractRecord {
    /// Value of a categorical column, if present
    pub fn category(&self, field: CategoryField) -> Option<&str> {
        match field {
            CategoryField::Modality => self.contracting_modality.as_deref(),
            CategoryField::City => self.city.as_deref(),
            CategoryField::ContractType => self.contract_type.as_deref(),
            CategoryField::Status => self.contract_status.as_deref(),
        }
    }
}

/// Categorical columns that accept set filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum)]
pub enum CategoryField {
    Modality,
    City,
    #[value(name = "type")]
    ContractType,
    Status,
}

impl CategoryField {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryField::Modality => "modality",
            CategoryField::City => "city",
            CategoryField::ContractType => "type",
            CategoryField::Status => "status",
        }
    }

    /// Dataset column backing this field
    pub fn column(&self) -> &'static str {
        match self {
            CategoryField::Modality => "modalidad_de_contratacion",
            CategoryField::City => "ciudad",
            CategoryField::ContractType => "tipo_de_contrato",
            CategoryField::Status => "estado_contrato",
        }
    }

    pub fn all() -> [CategoryField; 4] {
        [CategoryField::Modality, CategoryField::City, CategoryField::ContractType, CategoryField::Status]
    }
}
