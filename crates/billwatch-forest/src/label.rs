use std::fmt;

/// Classification of a scored transaction amount.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash,
    serde::Serialize, serde::Deserialize,
)]
pub enum AnomalyLabel {
    /// Typical spending relative to the trained model.
    Normal,
    /// Unusually large transaction.
    BillShock,
}

impl AnomalyLabel {
    /// Return the label as the string written to output tables.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AnomalyLabel::Normal => "Normal",
            AnomalyLabel::BillShock => "Bill Shock",
        }
    }

    /// Return `true` for [`AnomalyLabel::BillShock`].
    #[must_use]
    pub fn is_shock(self) -> bool {
        matches!(self, AnomalyLabel::BillShock)
    }
}

impl fmt::Display for AnomalyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
