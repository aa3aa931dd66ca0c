//! Visit step catalogs.
//!
//! Two fixed, ordered checklists: the standard preventative-maintenance
//! visit (10 steps) and the shorter prospecting visit used for outreach
//! and relationship building (5 steps). The catalogs are immutable
//! configuration data; navigation always consults them through
//! [`VisitKind::steps`] so the sequence cannot drift at runtime.

use serde::{Deserialize, Serialize};

/// The kind of a visit session, selecting its step catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitKind {
    /// A scheduled preventative-maintenance service visit.
    Standard,
    /// An outreach visit to a prospective customer.
    Prospecting,
}

impl VisitKind {
    /// The ordered step sequence for this kind.
    pub fn steps(&self) -> &'static [VisitStep] {
        match self {
            VisitKind::Standard => &STANDARD_VISIT_STEPS,
            VisitKind::Prospecting => &PROSPECTING_VISIT_STEPS,
        }
    }

    /// The step a new session of this kind starts on.
    pub fn first_step(&self) -> VisitStep {
        self.steps()[0]
    }

    /// Whether `step` belongs to this kind's catalog.
    pub fn contains(&self, step: VisitStep) -> bool {
        self.steps().contains(&step)
    }

    /// Wire/name form of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            VisitKind::Standard => "standard",
            VisitKind::Prospecting => "prospecting",
        }
    }
}

impl std::fmt::Display for VisitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One checklist step of a visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitStep {
    // Standard visit steps
    ClientIdentification,
    EquipmentIdentification,
    CoolerInspection,
    FreezerInspection,
    TemperatureVerification,
    CoilCleaning,
    MinorRepairs,
    GasketInspection,
    SinkPlumbing,
    FinalReport,
    // Prospecting visit steps
    BusinessIdentification,
    IntroductionNotes,
    EquipmentOverview,
    PainPoints,
    FollowUpPlanning,
}

/// Ordered checklist for a standard preventative-maintenance visit.
pub const STANDARD_VISIT_STEPS: [VisitStep; 10] = [
    VisitStep::ClientIdentification,
    VisitStep::EquipmentIdentification,
    VisitStep::CoolerInspection,
    VisitStep::FreezerInspection,
    VisitStep::TemperatureVerification,
    VisitStep::CoilCleaning,
    VisitStep::MinorRepairs,
    VisitStep::GasketInspection,
    VisitStep::SinkPlumbing,
    VisitStep::FinalReport,
];

/// Ordered checklist for a prospecting visit.
pub const PROSPECTING_VISIT_STEPS: [VisitStep; 5] = [
    VisitStep::BusinessIdentification,
    VisitStep::IntroductionNotes,
    VisitStep::EquipmentOverview,
    VisitStep::PainPoints,
    VisitStep::FollowUpPlanning,
];

impl VisitStep {
    /// Human-readable step title.
    pub fn title(&self) -> &'static str {
        match self {
            VisitStep::ClientIdentification => "Client Identification",
            VisitStep::EquipmentIdentification => "Equipment Identification",
            VisitStep::CoolerInspection => "Cooler Inspection",
            VisitStep::FreezerInspection => "Freezer Inspection",
            VisitStep::TemperatureVerification => "Temperature Verification",
            VisitStep::CoilCleaning => "Coil Cleaning",
            VisitStep::MinorRepairs => "Minor Repairs",
            VisitStep::GasketInspection => "Gasket Inspection",
            VisitStep::SinkPlumbing => "Sink & Plumbing",
            VisitStep::FinalReport => "Final Report",
            VisitStep::BusinessIdentification => "Business Identification",
            VisitStep::IntroductionNotes => "Introduction Notes",
            VisitStep::EquipmentOverview => "Equipment Overview",
            VisitStep::PainPoints => "Pain Points & Challenges",
            VisitStep::FollowUpPlanning => "Follow-up Planning",
        }
    }

    /// Wire/name form of the step id (matches the serde representation).
    pub fn as_str(&self) -> &'static str {
        match self {
            VisitStep::ClientIdentification => "client_identification",
            VisitStep::EquipmentIdentification => "equipment_identification",
            VisitStep::CoolerInspection => "cooler_inspection",
            VisitStep::FreezerInspection => "freezer_inspection",
            VisitStep::TemperatureVerification => "temperature_verification",
            VisitStep::CoilCleaning => "coil_cleaning",
            VisitStep::MinorRepairs => "minor_repairs",
            VisitStep::GasketInspection => "gasket_inspection",
            VisitStep::SinkPlumbing => "sink_plumbing",
            VisitStep::FinalReport => "final_report",
            VisitStep::BusinessIdentification => "business_identification",
            VisitStep::IntroductionNotes => "introduction_notes",
            VisitStep::EquipmentOverview => "equipment_overview",
            VisitStep::PainPoints => "pain_points",
            VisitStep::FollowUpPlanning => "follow_up_planning",
        }
    }
}

impl std::fmt::Display for VisitStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
