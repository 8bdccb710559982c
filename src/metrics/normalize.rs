use rust_decimal::Decimal;

use crate::errors::CalculationError;
use crate::metrics::calculator::utilization;
use crate::metrics::{Assessment, Reading};

pub fn validate_reading(reading: &Reading) -> Result<(), CalculationError> {
    if reading.total_liquidity < Decimal::ZERO {
        return Err(CalculationError::Negative {
            field: "total_liquidity",
            value: reading.total_liquidity.to_string(),
        });
    }
    if reading.available_liquidity < Decimal::ZERO {
        return Err(CalculationError::Negative {
            field: "available_liquidity",
            value: reading.available_liquidity.to_string(),
        });
    }
    Ok(())
}

/// Validate a reading and derive its utilization.
pub fn assess(reading: Reading) -> Result<Assessment, CalculationError> {
    validate_reading(&reading)?;
    let utilization_percent = utilization(reading.total_debt, reading.total_liquidity)?;
    Ok(Assessment {
        reading,
        utilization_percent,
    })
}
