//! Genre classification and loudness targets
//!
//! Range-based matching of the feature profile against a static
//! catalogue of ten genre profiles. Each of four features landing
//! inside its genre interval awards 25 points; the best score wins
//! with ties going to the first-declared genre. The classifier also
//! estimates whether the material is already mastered and damps the
//! loudness target accordingly.

use serde::{Deserialize, Serialize};

use crate::features::FeatureProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DynamicStyle {
    Competitive,
    Modern,
    Natural,
    Broadcast,
}

/// Streaming/delivery platforms with loudness normalization profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Platform {
    Spotify,
    AppleMusic,
    YouTube,
    SoundCloud,
    Tidal,
    AmazonMusic,
    Deezer,
    Podcast,
    RadioClub,
    Audiophile,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlatformProfile {
    pub target_lufs: f32,
    pub max_true_peak_db: f32,
    pub normalization: bool,
}

impl Platform {
    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Spotify => "Spotify",
            Platform::AppleMusic => "Apple Music",
            Platform::YouTube => "YouTube",
            Platform::SoundCloud => "SoundCloud",
            Platform::Tidal => "Tidal",
            Platform::AmazonMusic => "Amazon Music",
            Platform::Deezer => "Deezer",
            Platform::Podcast => "Podcast",
            Platform::RadioClub => "Radio/Club",
            Platform::Audiophile => "Audiophile",
        }
    }

    pub fn profile(&self) -> PlatformProfile {
        let (target_lufs, max_true_peak_db, normalization) = match self {
            Platform::Spotify => (-14.0, -1.0, true),
            Platform::AppleMusic => (-16.0, -1.0, true),
            Platform::YouTube => (-13.0, -1.0, true),
            Platform::SoundCloud => (-11.0, -0.5, false),
            Platform::Tidal => (-14.0, -1.0, true),
            Platform::AmazonMusic => (-14.0, -1.0, true),
            Platform::Deezer => (-15.0, -1.0, true),
            Platform::Podcast => (-16.0, -1.0, false),
            Platform::RadioClub => (-9.0, -0.3, false),
            Platform::Audiophile => (-18.0, -1.5, false),
        };
        PlatformProfile {
            target_lufs,
            max_true_peak_db,
            normalization,
        }
    }
}

/// Closed interval over one feature
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub min: f32,
    pub max: f32,
}

impl Interval {
    const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Expected feature ranges, loudness target, and delivery hints for
/// one genre.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenreProfile {
    pub low_end: Interval,
    pub transient_density: Interval,
    pub spectral_centroid: Interval,
    pub crest_factor: Interval,
    pub target_lufs: f32,
    pub platform: Platform,
    pub style: DynamicStyle,
}

/// Genre catalogue, in declaration (tie-break) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Genre {
    Electronic,
    HipHop,
    Rock,
    Pop,
    Classical,
    Jazz,
    Acoustic,
    Podcast,
    Indie,
    Country,
}

impl Genre {
    pub const ALL: [Genre; 10] = [
        Genre::Electronic,
        Genre::HipHop,
        Genre::Rock,
        Genre::Pop,
        Genre::Classical,
        Genre::Jazz,
        Genre::Acoustic,
        Genre::Podcast,
        Genre::Indie,
        Genre::Country,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Genre::Electronic => "EDM/Electronic",
            Genre::HipHop => "Hip-Hop/Rap",
            Genre::Rock => "Rock/Metal",
            Genre::Pop => "Pop/Top 40",
            Genre::Classical => "Classical/Orchestral",
            Genre::Jazz => "Jazz/Blues",
            Genre::Acoustic => "Acoustic/Folk",
            Genre::Podcast => "Podcast/Spoken Word",
            Genre::Indie => "Indie/Alternative",
            Genre::Country => "Country",
        }
    }

    pub fn profile(&self) -> GenreProfile {
        match self {
            Genre::Electronic => GenreProfile {
                low_end: Interval::new(0.35, 0.50),
                transient_density: Interval::new(8.0, 20.0),
                spectral_centroid: Interval::new(2000.0, 5000.0),
                crest_factor: Interval::new(3.0, 8.0),
                target_lufs: -8.0,
                platform: Platform::SoundCloud,
                style: DynamicStyle::Competitive,
            },
            Genre::HipHop => GenreProfile {
                low_end: Interval::new(0.40, 0.55),
                transient_density: Interval::new(5.0, 12.0),
                spectral_centroid: Interval::new(1500.0, 4000.0),
                crest_factor: Interval::new(3.0, 7.0),
                target_lufs: -9.0,
                platform: Platform::Spotify,
                style: DynamicStyle::Competitive,
            },
            Genre::Rock => GenreProfile {
                low_end: Interval::new(0.25, 0.40),
                transient_density: Interval::new(10.0, 25.0),
                spectral_centroid: Interval::new(2500.0, 6000.0),
                crest_factor: Interval::new(4.0, 10.0),
                target_lufs: -10.0,
                platform: Platform::Spotify,
                style: DynamicStyle::Modern,
            },
            Genre::Pop => GenreProfile {
                low_end: Interval::new(0.30, 0.45),
                transient_density: Interval::new(6.0, 15.0),
                spectral_centroid: Interval::new(2000.0, 5000.0),
                crest_factor: Interval::new(4.0, 9.0),
                target_lufs: -11.0,
                platform: Platform::AppleMusic,
                style: DynamicStyle::Modern,
            },
            Genre::Classical => GenreProfile {
                low_end: Interval::new(0.20, 0.35),
                transient_density: Interval::new(2.0, 8.0),
                spectral_centroid: Interval::new(1000.0, 4000.0),
                crest_factor: Interval::new(10.0, 25.0),
                target_lufs: -18.0,
                platform: Platform::Tidal,
                style: DynamicStyle::Natural,
            },
            Genre::Jazz => GenreProfile {
                low_end: Interval::new(0.25, 0.40),
                transient_density: Interval::new(5.0, 12.0),
                spectral_centroid: Interval::new(1500.0, 4500.0),
                crest_factor: Interval::new(8.0, 18.0),
                target_lufs: -16.0,
                platform: Platform::Tidal,
                style: DynamicStyle::Natural,
            },
            Genre::Acoustic => GenreProfile {
                low_end: Interval::new(0.20, 0.35),
                transient_density: Interval::new(3.0, 10.0),
                spectral_centroid: Interval::new(1200.0, 4000.0),
                crest_factor: Interval::new(8.0, 16.0),
                target_lufs: -16.0,
                platform: Platform::AppleMusic,
                style: DynamicStyle::Natural,
            },
            Genre::Podcast => GenreProfile {
                low_end: Interval::new(0.15, 0.30),
                transient_density: Interval::new(1.0, 5.0),
                spectral_centroid: Interval::new(500.0, 2000.0),
                crest_factor: Interval::new(6.0, 12.0),
                target_lufs: -16.0,
                platform: Platform::Podcast,
                style: DynamicStyle::Broadcast,
            },
            Genre::Indie => GenreProfile {
                low_end: Interval::new(0.25, 0.40),
                transient_density: Interval::new(6.0, 14.0),
                spectral_centroid: Interval::new(1800.0, 5000.0),
                crest_factor: Interval::new(6.0, 14.0),
                target_lufs: -13.0,
                platform: Platform::Spotify,
                style: DynamicStyle::Modern,
            },
            Genre::Country => GenreProfile {
                low_end: Interval::new(0.25, 0.38),
                transient_density: Interval::new(6.0, 13.0),
                spectral_centroid: Interval::new(2000.0, 5500.0),
                crest_factor: Interval::new(6.0, 12.0),
                target_lufs: -12.0,
                platform: Platform::Spotify,
                style: DynamicStyle::Modern,
            },
        }
    }

    /// 25 points per feature landing inside its interval
    pub fn score(&self, features: &FeatureProfile) -> u8 {
        let p = self.profile();
        let mut score = 0u8;
        if p.low_end.contains(features.low_energy_ratio) {
            score += 25;
        }
        if p.transient_density.contains(features.transient_density) {
            score += 25;
        }
        if p.spectral_centroid.contains(features.spectral_centroid_hz) {
            score += 25;
        }
        if p.crest_factor.contains(features.crest_factor) {
            score += 25;
        }
        score
    }
}

/// Signs that the material has already been through a mastering chain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MasteringStatus {
    pub is_loud: bool,
    pub is_compressed: bool,
    pub is_limited: bool,
    pub is_processed: bool,
    pub is_mastered: bool,
    pub confidence: f32,
}

impl MasteringStatus {
    /// Three of four indicators present reads as already mastered
    pub fn from_features(features: &FeatureProfile) -> Self {
        let is_loud = features.rms_db > -16.0;
        let is_compressed = features.crest_factor > 0.0 && features.crest_factor < 6.0;
        let is_limited = features.peak_db > -1.0;
        let is_processed = features.brightness() > 0.25;

        let count = [is_loud, is_compressed, is_limited, is_processed]
            .iter()
            .filter(|b| **b)
            .count();

        Self {
            is_loud,
            is_compressed,
            is_limited,
            is_processed,
            is_mastered: count >= 3,
            confidence: count as f32 / 4.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreMatch {
    pub genre: Genre,
    pub name: String,
    /// Best score over 100
    pub confidence: f32,
    /// Genre target adjusted for mastering status and dynamics
    pub target_lufs: f32,
    pub platform: Platform,
    pub style: DynamicStyle,
    pub mastering: MasteringStatus,
    /// Raw score per genre, catalogue order
    pub scores: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct GenreClassifier;

impl GenreClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Score every genre and return the best match with its damped
    /// loudness target. Ties keep the first-declared genre.
    pub fn classify(&self, features: &FeatureProfile) -> GenreMatch {
        let scores: Vec<u8> = Genre::ALL.iter().map(|g| g.score(features)).collect();

        let mut best = Genre::ALL[0];
        let mut best_score = scores[0];
        for (genre, &score) in Genre::ALL.iter().zip(scores.iter()).skip(1) {
            if score > best_score {
                best_score = score;
                best = *genre;
            }
        }

        let mastering = MasteringStatus::from_features(features);
        let profile = best.profile();
        let target_lufs = Self::optimal_lufs(&profile, features, &mastering);

        log::debug!(
            "genre match: {} ({best_score}/100), target {target_lufs} LUFS",
            best.display_name()
        );

        GenreMatch {
            genre: best,
            name: best.display_name().to_string(),
            confidence: best_score as f32 / 100.0,
            target_lufs,
            platform: profile.platform,
            style: profile.style,
            mastering,
            scores,
        }
    }

    /// Override path: keep the caller's genre but still compute
    /// mastering status and the damped target.
    pub fn with_override(&self, genre: Genre, features: &FeatureProfile) -> GenreMatch {
        let scores: Vec<u8> = Genre::ALL.iter().map(|g| g.score(features)).collect();
        let mastering = MasteringStatus::from_features(features);
        let profile = genre.profile();
        GenreMatch {
            genre,
            name: genre.display_name().to_string(),
            confidence: 1.0,
            target_lufs: Self::optimal_lufs(&profile, features, &mastering),
            platform: profile.platform,
            style: profile.style,
            mastering,
            scores,
        }
    }

    /// Pre-mastered material gets a conservative ceiling; high crest
    /// material keeps its dynamics.
    fn optimal_lufs(
        profile: &GenreProfile,
        features: &FeatureProfile,
        mastering: &MasteringStatus,
    ) -> f32 {
        let mut target = profile.target_lufs;
        if mastering.is_mastered {
            target = target.max(-13.0);
        }
        if features.crest_factor > 12.0 {
            target = target.min(-16.0);
        }
        target
    }
}
