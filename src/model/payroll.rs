use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Payroll {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1001)]
    pub employee_id: u64,
    #[schema(example = "2026-01-01", value_type = String, format = "date")]
    pub month: NaiveDate,
    #[schema(example = 50000.0)]
    pub base_salary: f64,
    #[schema(example = 5000.0)]
    pub bonus: f64,
    #[schema(example = 2000.0)]
    pub deductions: f64,
    #[schema(example = 53000.0)]
    pub net_salary: f64,
}

/// Net salary is always derived server-side.
pub fn net_salary(base: f64, bonus: f64, deductions: f64) -> f64 {
    base + bonus - deductions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn net_is_base_plus_bonus_minus_deductions() {
        assert_eq!(net_salary(50000.0, 5000.0, 2000.0), 53000.0);
        assert_eq!(net_salary(1000.0, 0.0, 0.0), 1000.0);
        assert_eq!(net_salary(1000.0, 0.0, 1500.0), -500.0);
    }
}
