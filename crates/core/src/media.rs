use serde::{Deserialize, Serialize};

use crate::types::MediaId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Show {
    pub id: MediaId,
    pub title: String,
    pub year: Option<i32>,
    #[serde(default)]
    pub genres: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movie {
    pub id: MediaId,
    pub title: String,
    pub year: Option<i32>,
    #[serde(default)]
    pub genres: Vec<String>,
}

/// Position of an episode within its season's run, as tagged by the remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpisodeType {
    #[default]
    Standard,
    SeriesPremiere,
    SeasonPremiere,
    MidSeasonPremiere,
    MidSeasonFinale,
    SeasonFinale,
    SeriesFinale,
}

impl EpisodeType {
    /// Opens a season. Mid-season premieres do not count.
    pub fn is_premiere(self) -> bool {
        matches!(self, Self::SeriesPremiere | Self::SeasonPremiere)
    }

    /// Closes a season. Mid-season finales do not count.
    pub fn is_finale(self) -> bool {
        matches!(self, Self::SeasonFinale | Self::SeriesFinale)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    pub id: MediaId,
    pub season: u32,
    pub number: u32,
    pub title: Option<String>,
    #[serde(default)]
    pub episode_type: EpisodeType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mid_season_markers_are_not_season_boundaries() {
        assert!(EpisodeType::SeasonPremiere.is_premiere());
        assert!(EpisodeType::SeriesPremiere.is_premiere());
        assert!(!EpisodeType::MidSeasonPremiere.is_premiere());
        assert!(EpisodeType::SeriesFinale.is_finale());
        assert!(!EpisodeType::MidSeasonFinale.is_finale());
        assert!(!EpisodeType::Standard.is_finale());
    }

    #[test]
    fn episode_type_defaults_to_standard_when_missing() {
        let ep: Episode =
            serde_json::from_str(r#"{"id":5,"season":1,"number":2,"title":null}"#).unwrap();
        assert_eq!(ep.episode_type, EpisodeType::Standard);
        let ep: Episode = serde_json::from_str(
            r#"{"id":6,"season":2,"number":1,"title":"Pilot","episode_type":"season_premiere"}"#,
        )
        .unwrap();
        assert!(ep.episode_type.is_premiere());
    }
}
