//! Unit systems and the conversions the kernel needs.
//!
//! Rates are depth per hour (in/hr or mm/hr), areas are acres or hectares,
//! flows are cfs or m³/s, concentrations are mg/L and loads are pounds or
//! kilograms.

/// Unit system of a project.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnitSystem {
    /// US customary: in/hr, acres, cfs, ft³, lb.
    #[default]
    Us,
    /// SI: mm/hr, hectares, m³/s, m³, kg.
    Si,
}

impl UnitSystem {
    /// Flow produced by a unit rate over a unit area
    /// (`in/hr · ac → cfs` or `mm/hr · ha → m³/s`).
    pub fn flow_per_rate_area(self) -> f64 {
        match self {
            Self::Us => 43_560.0 / 12.0 / 3_600.0,
            Self::Si => 10_000.0 / 1_000.0 / 3_600.0,
        }
    }

    /// Volume held by a unit depth over a unit area (`in · ac → ft³` or
    /// `mm · ha → m³`).
    pub fn volume_per_depth_area(self) -> f64 {
        self.flow_per_rate_area() * 3_600.0
    }

    /// Litres in one unit of flow volume.
    pub fn liters_per_volume(self) -> f64 {
        match self {
            Self::Us => 28.316_846_592,
            Self::Si => 1_000.0,
        }
    }

    /// Reported load mass per milligram.
    pub fn mass_per_mg(self) -> f64 {
        match self {
            Self::Us => 2.204_622_62e-6,
            Self::Si => 1.0e-6,
        }
    }

    /// Load carried by `volume` units of water at `conc` mg/L, in reported
    /// mass units.
    pub fn load(self, conc: f64, volume: f64) -> f64 {
        conc * volume * self.liters_per_volume() * self.mass_per_mg()
    }
}
