//! Composite alert rules over the per-engine states of one symbol and date

use crate::models::alert::{Alert, AlertKind};
use crate::models::indicators::{ForceIndexState, MomentumState, ObvCross, SymbolReadings};

pub const OVERSOLD_DESCRIPTION: &str = "Williams %R and Force Index Oversold Alert";
pub const OBV_POSITIVE_DESCRIPTION: &str = "OBV Positive Crossover";
pub const OBV_NEGATIVE_DESCRIPTION: &str = "OBV Negative Crossover";

/// States read back for one symbol plus any Heikin-Ashi alerts detected
#[derive(Debug, Clone, Default)]
pub struct AlertInputs {
    pub williams_r: Option<MomentumState>,
    pub force_index: Option<ForceIndexState>,
    pub obv: Option<ObvCross>,
    pub heikin_ashi: Vec<Alert>,
}

impl AlertInputs {
    pub fn from_readings(readings: &SymbolReadings, heikin_ashi: Vec<Alert>) -> Self {
        Self {
            williams_r: readings.williams_r.as_ref().map(|r| r.state),
            force_index: readings.force_index.as_ref().map(|r| r.state),
            obv: readings.anchored_obv.as_ref().map(|r| r.cross),
            heikin_ashi,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AlertAggregator {
    obv_requires_oversold: bool,
}

impl Default for AlertAggregator {
    fn default() -> Self {
        Self::new(true)
    }
}

impl AlertAggregator {
    pub fn new(obv_requires_oversold: bool) -> Self {
        Self {
            obv_requires_oversold,
        }
    }

    /// Both momentum and volume-flow machines entered a fresh state this run
    pub fn is_oversold(williams_r: Option<MomentumState>, force_index: Option<ForceIndexState>) -> bool {
        matches!(williams_r, Some(MomentumState::Fresh))
            && force_index.map(|s| s.is_fresh()).unwrap_or(false)
    }

    /// Alerts for one symbol and date, in ledger order
    pub fn compose(&self, inputs: &AlertInputs) -> Vec<Alert> {
        let mut alerts = Vec::new();

        let oversold = Self::is_oversold(inputs.williams_r, inputs.force_index);
        if oversold {
            alerts.push(Alert::new(
                AlertKind::Oversold,
                MomentumState::Fresh.as_str(),
                OVERSOLD_DESCRIPTION,
            ));
        }

        if oversold || !self.obv_requires_oversold {
            match inputs.obv {
                Some(ObvCross::PositiveCross) => alerts.push(Alert::new(
                    AlertKind::ObvPositive,
                    ObvCross::PositiveCross.as_str(),
                    OBV_POSITIVE_DESCRIPTION,
                )),
                Some(ObvCross::NegativeCross) => alerts.push(Alert::new(
                    AlertKind::ObvNegative,
                    ObvCross::NegativeCross.as_str(),
                    OBV_NEGATIVE_DESCRIPTION,
                )),
                Some(ObvCross::None) | None => {}
            }
        }

        alerts.extend(inputs.heikin_ashi.iter().cloned());
        alerts
    }
}
