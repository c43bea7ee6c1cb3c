use serde::Serialize;

/// Qualitative performance band of a final score, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PerformanceTier {
    Excellent,
    Good,
    Acceptable,
    Unsatisfactory,
}

impl PerformanceTier {
    /// All tiers in display (and stacked-bar) order.
    pub const ALL: [PerformanceTier; 4] = [
        PerformanceTier::Excellent,
        PerformanceTier::Good,
        PerformanceTier::Acceptable,
        PerformanceTier::Unsatisfactory,
    ];

    pub fn index(self) -> usize {
        match self {
            PerformanceTier::Excellent => 0,
            PerformanceTier::Good => 1,
            PerformanceTier::Acceptable => 2,
            PerformanceTier::Unsatisfactory => 3,
        }
    }
}

/// Lower bounds of the three upper bands. Anything below `acceptable_min` is unsatisfactory.
///
/// | Range          | Tier           |
/// |----------------|----------------|
/// | >= 91          | Excellent      |
/// | >= 80          | Good           |
/// | >= 70          | Acceptable     |
/// | < 70           | Unsatisfactory |
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierBands {
    pub excellent_min: f64,
    pub good_min: f64,
    pub acceptable_min: f64,
}

impl Default for TierBands {
    fn default() -> Self {
        Self {
            excellent_min: 91.0,
            good_min: 80.0,
            acceptable_min: 70.0,
        }
    }
}

impl TierBands {
    pub fn classify(&self, score: f64) -> PerformanceTier {
        classify(score, self)
    }

    /// One-line legend, e.g. `excelente (91–100) · bueno (80–90) · ...`.
    pub fn legend(&self, styles: &TierStyles) -> String {
        let hi = |min: f64| min.ceil() as i64 - 1;
        format!(
            "Desempeño {} ({}–100) · {} ({}–{}) · {} ({}–{}) · {} (0–{})",
            styles.get(PerformanceTier::Excellent).short_label.to_lowercase(),
            self.excellent_min,
            styles.get(PerformanceTier::Good).short_label.to_lowercase(),
            self.good_min,
            hi(self.excellent_min),
            styles.get(PerformanceTier::Acceptable).short_label.to_lowercase(),
            self.acceptable_min,
            hi(self.good_min),
            styles.get(PerformanceTier::Unsatisfactory).short_label.to_lowercase(),
            hi(self.acceptable_min),
        )
    }
}

/// Maps a final score to its tier. Total: non-finite and negative scores are unsatisfactory.
pub fn classify(score: f64, bands: &TierBands) -> PerformanceTier {
    if !score.is_finite() || score < 0.0 {
        return PerformanceTier::Unsatisfactory;
    }
    match score {
        s if s >= bands.excellent_min => PerformanceTier::Excellent,
        s if s >= bands.good_min => PerformanceTier::Good,
        s if s >= bands.acceptable_min => PerformanceTier::Acceptable,
        _ => PerformanceTier::Unsatisfactory,
    }
}

/// Display metadata for one tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierStyle {
    pub label: String,
    pub short_label: String,
    pub foreground: String,
    pub background: String,
}

impl TierStyle {
    fn new(label: &str, short_label: &str, foreground: &str, background: &str) -> Self {
        Self {
            label: label.to_string(),
            short_label: short_label.to_string(),
            foreground: foreground.to_string(),
            background: background.to_string(),
        }
    }
}

/// Styles for all four tiers, indexed by [`PerformanceTier::index`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierStyles([TierStyle; 4]);

impl Default for TierStyles {
    fn default() -> Self {
        Self([
            TierStyle::new("Desempeño excelente", "EXCELENTE", "#14532d", "#dcfce7"),
            TierStyle::new("Desempeño bueno", "BUENO", "#1d4ed8", "#dbeafe"),
            TierStyle::new("Desempeño aceptable", "ACEPTABLE", "#92400e", "#ffedd5"),
            TierStyle::new("Desempeño insatisfactorio", "INSATISFACTORIO", "#7f1d1d", "#fee2e2"),
        ])
    }
}

impl TierStyles {
    pub fn get(&self, tier: PerformanceTier) -> &TierStyle {
        &self.0[tier.index()]
    }
}
