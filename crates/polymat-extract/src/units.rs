//! Unit normalization table.
//!
//! Maps raw unit spellings found in paper text onto canonical units,
//! rescaling the numeric value (and error) where the conversion is a
//! scale factor, or shifting it where it is an offset.
//!
//! The Kelvin conversion subtracts exactly 273, not 273.15. This matches
//! the system polymat reimplements; see DESIGN.md open questions before
//! changing it.

use std::collections::HashMap;

/// How a source unit maps onto its canonical unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Conversion {
    /// Spelling change only.
    Identity,
    /// Multiply value and error by the factor.
    Scale(f64),
    /// Add the offset to the value; error is unchanged.
    Offset(f64),
}

/// One normalization rule.
#[derive(Debug, Clone, Copy)]
pub struct UnitRule {
    pub to: &'static str,
    pub conv: Conversion,
}

/// Fixed unit-normalization table.
pub struct UnitTable {
    rules: HashMap<&'static str, UnitRule>,
}

impl Default for UnitTable {
    fn default() -> Self {
        Self::new()
    }
}

use Conversion::{Identity, Offset, Scale};

const RULES: &[(&str, &str, Conversion)] = &[
    // Temperature
    ("K", "° C", Offset(-273.0)),
    ("°C", "° C", Identity),
    ("° C", "° C", Identity),
    ("C", "° C", Identity),
    ("oC", "° C", Identity),
    ("℃", "° C", Identity),
    // Pressure / modulus / strength
    ("Pa", "MPa", Scale(1e-6)),
    ("kPa", "MPa", Scale(1e-3)),
    ("MPa", "MPa", Identity),
    ("GPa", "MPa", Scale(1e3)),
    ("bar", "MPa", Scale(0.1)),
    ("mbar", "MPa", Scale(1e-4)),
    ("atm", "MPa", Scale(0.101325)),
    // Molecular weight
    ("g/mol", "g/mol", Identity),
    ("kg/mol", "g/mol", Scale(1e3)),
    ("Da", "g/mol", Identity),
    ("kDa", "g/mol", Scale(1e3)),
    ("g mol-1", "g/mol", Identity),
    ("g mol^{-1}", "g/mol", Identity),
    // Energy
    ("eV", "eV", Identity),
    ("meV", "eV", Scale(1e-3)),
    ("kJ/mol", "kJ/mol", Identity),
    ("J/mol", "kJ/mol", Scale(1e-3)),
    ("kcal/mol", "kJ/mol", Scale(4.184)),
    ("J/g", "J/g", Identity),
    ("kJ/kg", "J/g", Identity),
    // Conductivity
    ("S/cm", "S/cm", Identity),
    ("S cm-1", "S/cm", Identity),
    ("S cm^{-1}", "S/cm", Identity),
    ("mS/cm", "S/cm", Scale(1e-3)),
    ("μS/cm", "S/cm", Scale(1e-6)),
    ("uS/cm", "S/cm", Scale(1e-6)),
    ("S/m", "S/cm", Scale(1e-2)),
    // Density
    ("g/cm3", "g/cm3", Identity),
    ("g/cm^3", "g/cm3", Identity),
    ("g cm-3", "g/cm3", Identity),
    ("g cm^{-3}", "g/cm3", Identity),
    ("g/cc", "g/cm3", Identity),
    ("g/mL", "g/cm3", Identity),
    ("kg/m3", "g/cm3", Scale(1e-3)),
    // Viscosity
    ("Pa s", "Pa s", Identity),
    ("Pa·s", "Pa s", Identity),
    ("mPa·s", "Pa s", Scale(1e-3)),
    ("cP", "Pa s", Scale(1e-3)),
    ("P", "Pa s", Scale(0.1)),
    // Thermal conductivity
    ("W/mK", "W/mK", Identity),
    ("W/m·K", "W/mK", Identity),
    ("W m-1 K-1", "W/mK", Identity),
    ("mW/mK", "W/mK", Scale(1e-3)),
    // Capacity
    ("mAh/g", "mAh/g", Identity),
    ("Ah/g", "mAh/g", Scale(1e3)),
    ("Ah/kg", "mAh/g", Identity),
    // Surface tension
    ("mN/m", "mN/m", Identity),
    ("dyn/cm", "mN/m", Identity),
    // Frequency
    ("Hz", "Hz", Identity),
    ("kHz", "Hz", Scale(1e3)),
    ("MHz", "Hz", Scale(1e6)),
    ("GHz", "Hz", Scale(1e9)),
    // Voltage
    ("V", "V", Identity),
    ("mV", "V", Scale(1e-3)),
    ("kV", "V", Scale(1e3)),
    // Length
    ("nm", "nm", Identity),
    ("Å", "nm", Scale(0.1)),
    ("μm", "μm", Identity),
    ("micron", "μm", Identity),
    // Angles (contact angle)
    ("°", "°", Identity),
    ("deg", "°", Identity),
    ("degree", "°", Identity),
    ("degrees", "°", Identity),
    // Fractions
    ("%", "%", Identity),
    ("wt%", "wt%", Identity),
    ("wt.%", "wt%", Identity),
    // Gas permeability
    ("Barrer", "Barrer", Identity),
];

impl UnitTable {
    pub fn new() -> Self {
        let mut rules = HashMap::with_capacity(RULES.len());
        for &(from, to, conv) in RULES {
            rules.insert(from, UnitRule { to, conv });
        }
        Self { rules }
    }

    /// Number of normalization rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Look up the rule for a raw unit spelling, tolerating a trailing
    /// sentence period.
    pub fn rule(&self, unit: &str) -> Option<&UnitRule> {
        self.rules
            .get(unit)
            .or_else(|| self.rules.get(unit.trim_end_matches('.')))
    }

    /// Normalize a unit, rescaling value and error consistently.
    ///
    /// Unknown units pass through unchanged.
    pub fn normalize(
        &self,
        unit: &str,
        value: Option<f64>,
        error: Option<f64>,
    ) -> (String, Option<f64>, Option<f64>) {
        match self.rule(unit) {
            Some(rule) => {
                let (value, error) = match rule.conv {
                    Identity => (value, error),
                    Scale(s) => (value.map(|v| v * s), error.map(|e| e * s)),
                    Offset(o) => (value.map(|v| v + o), error),
                };
                (rule.to.to_string(), value, error)
            }
            None => (unit.to_string(), value, error),
        }
    }

    /// Iterate over all (from, rule) entries, for table round-trip tests.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &UnitRule)> + '_ {
        self.rules.iter().map(|(k, v)| (*k, v))
    }
}
