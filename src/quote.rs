use crate::model::UnknownCategory;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Shown under every estimate.
pub const ESTIMATE_NOTE: &str = "This is a preliminary estimate only. The final price depends on site \
conditions, preparation work and other details. Contact us for a formal quotation.";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QuoteError {
    #[error("Width and length must be positive numbers, got {width} x {length}")]
    InvalidDimensions { width: f64, length: f64 },
}

/// Build package; each has a flat price per square metre.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Basic,
    Standard,
    Premium,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Self::Basic, Self::Standard, Self::Premium];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Standard => "standard",
            Self::Premium => "premium",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Basic => "Standard",
            Self::Standard => "Standard Plus",
            Self::Premium => "Premium",
        }
    }

    /// Baht per square metre.
    pub fn rate(self) -> u32 {
        match self {
            Self::Basic => 2500,
            Self::Standard => 3500,
            Self::Premium => 4500,
        }
    }

    pub fn features(self) -> &'static [&'static str] {
        match self {
            Self::Basic => &["TIS-certified steel frame", "Metal sheet roof", "Rain gutters"],
            Self::Standard => &[
                "Reinforced steel frame",
                "Metal sheet roof",
                "Metal sheet walls",
                "Rain gutters",
                "Sliding door",
            ],
            Self::Premium => &[
                "Extra-thick steel frame",
                "Heat-insulated roof",
                "Sandwich panel walls",
                "Automatic sliding door",
                "PVC rain gutters",
                "Basic electrical system",
            ],
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownCategory {
                kind: "package",
                value: s.to_string(),
            })
    }
}

/// Volume discount in percent: 5% from 500 m², 10% from 1,000 m².
pub fn discount_percent(area: f64) -> u32 {
    if area >= 1000.0 {
        10
    } else if area >= 500.0 {
        5
    } else {
        0
    }
}

/// Rough price estimate for a rectangular building.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub width: f64,
    pub length: f64,
    pub area: f64,
    pub tier: Tier,
    pub base_price: f64,
    pub discount_percent: u32,
    pub discount_amount: f64,
    pub total: f64,
}

impl Quote {
    pub fn calculate(width: f64, length: f64, tier: Tier) -> Result<Self, QuoteError> {
        if !(width.is_finite() && length.is_finite() && width > 0.0 && length > 0.0) {
            return Err(QuoteError::InvalidDimensions { width, length });
        }
        let area = width * length;
        let base_price = area * f64::from(tier.rate());
        let discount_percent = discount_percent(area);
        let discount_amount = base_price * f64::from(discount_percent) / 100.0;
        Ok(Self {
            width,
            length,
            area,
            tier,
            base_price,
            discount_percent,
            discount_amount,
            total: base_price - discount_amount,
        })
    }

    pub fn summary(&self) -> String {
        let mut out = format!(
            "{} x {} m = {} sq.m.\n\
             Package: {} (THB {}/sq.m.)\n\
             Base price: THB {}\n",
            self.width,
            self.length,
            group_thousands(self.area),
            self.tier.label(),
            group_thousands(f64::from(self.tier.rate())),
            group_thousands(self.base_price),
        );
        if self.discount_percent > 0 {
            out.push_str(&format!(
                "Discount ({}%): -THB {}\n",
                self.discount_percent,
                group_thousands(self.discount_amount)
            ));
        }
        out.push_str(&format!("Estimated total: THB {}\n\nIncludes:\n", group_thousands(self.total)));
        for feature in self.tier.features() {
            out.push_str(&format!("- {feature}\n"));
        }
        out.push('\n');
        out.push_str(ESTIMATE_NOTE);
        out
    }
}

/// Round to a whole number and group digits with commas.
pub fn group_thousands(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{}", rounded.abs() as u64);
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0.0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
