use serde::Serialize;
use std::fmt;

/// Coarse genre label from a fixed decision table over tempo and brightness.
/// Heuristic only; there is no trained model behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Genre {
    #[serde(rename = "Electronic/Dance")]
    ElectronicDance,
    #[serde(rename = "Rock/Metal")]
    RockMetal,
    #[serde(rename = "Pop")]
    Pop,
    #[serde(rename = "Hip-Hop")]
    HipHop,
    #[serde(rename = "Jazz/Blues")]
    JazzBlues,
    #[serde(rename = "Classical/Ambient")]
    ClassicalAmbient,
}

impl Genre {
    pub const ALL: [Genre; 6] = [
        Genre::ElectronicDance,
        Genre::RockMetal,
        Genre::Pop,
        Genre::HipHop,
        Genre::JazzBlues,
        Genre::ClassicalAmbient,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Genre::ElectronicDance => "Electronic/Dance",
            Genre::RockMetal => "Rock/Metal",
            Genre::Pop => "Pop",
            Genre::HipHop => "Hip-Hop",
            Genre::JazzBlues => "Jazz/Blues",
            Genre::ClassicalAmbient => "Classical/Ambient",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// All thresholds are strict: a tempo of exactly 140 BPM falls in the
/// `> 100` band.
pub fn classify(tempo: f64, centroid_mean: f64) -> Genre {
    if tempo > 140.0 {
        if centroid_mean > 3000.0 {
            Genre::ElectronicDance
        } else {
            Genre::RockMetal
        }
    } else if tempo > 100.0 {
        if centroid_mean > 2000.0 {
            Genre::Pop
        } else {
            Genre::HipHop
        }
    } else if tempo > 60.0 {
        Genre::JazzBlues
    } else {
        Genre::ClassicalAmbient
    }
}
