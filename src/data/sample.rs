//! The bundled sample upload.
//!
//! Mirrors what a customer typically sends: monthly scope 1/2 emissions plus
//! revenue for a handful of facilities, with one unusable row (`F003` has a
//! non-numeric scope 1 value).

pub const SAMPLE_CSV: &str = "
facility_id,facility_name,month,year,scope1_emissions,scope2_emissions,revenue
F001,Malaysia HQ,1,2024,150.5,80.2,500000
F001,Malaysia HQ,2,2024,145.0,78.5,520000
F002,Singapore Office,1,2024,45.0,120.0,300000
F002,Singapore Office,2,2024,48.5,125.0,310000
F003,Jakarta Plant,1,2024,invalid,200.0,800000
";
