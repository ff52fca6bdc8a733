//! Column names of the sustainability dataset

pub const TIMESTAMP: &str = "Timestamp";

pub const CO2: &str = "CO2_Emissions_kg";
pub const ENERGY: &str = "Energy_Consumption_kWh";
pub const WASTE: &str = "Waste_Generated_kg";
pub const HEAT: &str = "Heat_Generation_MWh";
pub const ELECTRICITY: &str = "Electricity_Generation_MWh";

// Derived columns, recomputed on every load
pub const YEAR: &str = "Year";
pub const MONTH: &str = "Month";
pub const DAY_OF_YEAR: &str = "DayOfYear";
pub const ELAPSED_DAYS: &str = "Elapsed_Days";
pub const SCORE: &str = "Sustainability_Score";

/// Forecastable metrics, in presentation order
pub const KNOWN_METRICS: [&str; 5] = [CO2, WASTE, SCORE, HEAT, ELECTRICITY];

/// Weights of the raw sustainability score
pub const SCORE_WEIGHTS: [(&str, f64); 3] = [(CO2, -0.5), (ENERGY, -0.3), (WASTE, -0.2)];

/// Columns the feature deriver produces
pub const DERIVED: [&str; 5] = [YEAR, MONTH, DAY_OF_YEAR, ELAPSED_DAYS, SCORE];
