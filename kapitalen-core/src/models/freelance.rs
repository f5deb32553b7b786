use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type FreelanceId = Uuid;

/// ENK invoice. `mva` is cached when the record is written and is never
/// recomputed on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreelanceIncome {
    pub id: FreelanceId,
    pub client: String,
    pub description: String,
    /// Amount excluding MVA.
    pub amount: Decimal,
    pub mva: Decimal,
}

impl FreelanceIncome {
    pub fn new(
        client: impl Into<String>,
        description: impl Into<String>,
        amount: Decimal,
        mva_rate: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            client: client.into(),
            description: description.into(),
            amount,
            mva: amount * mva_rate,
        }
    }

    pub fn amount_with_mva(&self) -> Decimal {
        self.amount + self.mva
    }
}
