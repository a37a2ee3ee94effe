// src/services/message_format.rs
//
// Channel message rendering.
//
// The field set and order are part of the contract with the channel's
// readers; change them only together with whatever parses the posts.
// Rendering is pure: the same entity always produces the same text.

use crate::domain::{Anime, Episode};

const MISSING: &str = "N/A";

fn field(out: &mut String, label: &str, value: Option<String>) {
    out.push_str(label);
    out.push_str(": ");
    out.push_str(value.as_deref().unwrap_or(MISSING));
    out.push('\n');
}

fn list(values: &[String]) -> Option<String> {
    if values.is_empty() {
        None
    } else {
        Some(values.join(", "))
    }
}

pub fn render_anime(anime: &Anime) -> String {
    let mut out = String::new();
    field(&mut out, "Anime ID", Some(anime.source_id.to_string()));
    field(&mut out, "Title", Some(anime.title.clone()));
    field(&mut out, "English Title", anime.title_english.clone());
    field(&mut out, "Japanese Title", anime.title_japanese.clone());
    field(&mut out, "Type", anime.kind.clone());
    field(&mut out, "Episodes", anime.episodes.map(|n| n.to_string()));
    field(&mut out, "Status", anime.status.clone());
    field(&mut out, "Airing", anime.airing.map(|a| a.to_string()));
    field(&mut out, "Aired", anime.aired.clone());
    field(&mut out, "Rating", anime.rating.clone());
    field(&mut out, "Duration", anime.duration.clone());
    field(&mut out, "Season", anime.season.clone());
    field(&mut out, "Year", anime.year.map(|y| y.to_string()));
    field(&mut out, "Studios", list(&anime.studios));
    field(&mut out, "Producers", list(&anime.producers));
    field(&mut out, "Synopsis", anime.synopsis.clone());
    out
}

pub fn render_episode(episode: &Episode) -> String {
    let mut out = String::new();
    field(&mut out, "Episode ID", episode.id.map(|id| id.to_string()));
    field(&mut out, "Anime ID", Some(episode.anime_id.to_string()));
    field(&mut out, "Source ID", Some(episode.source_id.to_string()));
    field(&mut out, "Episode Number", Some(episode.episode_number.to_string()));
    field(&mut out, "Watch Link", Some(episode.watch_link.clone()));
    field(&mut out, "Download Link HD", episode.download_link_hd.clone());
    field(&mut out, "Download Link SD", episode.download_link_sd.clone());
    field(&mut out, "Temp", Some(episode.temp.to_string()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AnimeId, AnimeMetadata, EpisodeCandidate, EpisodeId};

    #[test]
    fn test_anime_fields_in_order() {
        let anime = Anime::from_metadata(AnimeMetadata {
            source_id: 52991,
            title: "Sousou no Frieren".to_string(),
            title_english: Some("Frieren: Beyond Journey's End".to_string()),
            episodes: Some(28),
            airing: Some(false),
            studios: vec!["Madhouse".to_string()],
            producers: vec!["Aniplex".to_string(), "Dentsu".to_string()],
            ..Default::default()
        })
        .unwrap();

        let text = render_anime(&anime);
        let labels: Vec<&str> = text
            .lines()
            .map(|line| line.split(": ").next().unwrap())
            .collect();

        assert_eq!(
            labels,
            vec![
                "Anime ID", "Title", "English Title", "Japanese Title", "Type", "Episodes",
                "Status", "Airing", "Aired", "Rating", "Duration", "Season", "Year",
                "Studios", "Producers", "Synopsis",
            ]
        );
        assert!(text.starts_with("Anime ID: 52991\nTitle: Sousou no Frieren\n"));
        assert!(text.contains("Japanese Title: N/A\n"));
        assert!(text.contains("Airing: false\n"));
        assert!(text.contains("Producers: Aniplex, Dentsu\n"));
        assert_eq!(text, render_anime(&anime));
    }

    #[test]
    fn test_episode_rendering() {
        let episode = Episode::from_candidate(
            AnimeId(3),
            EpisodeCandidate {
                source_id: 52991,
                episode_number: 12,
                watch_link: "https://catalog.test/animes/frieren/12".to_string(),
                download_link_hd: None,
                download_link_sd: Some("https://cdn.test/mp4/frieren-12.mp4".to_string()),
                temp: true,
            },
        )
        .unwrap()
        .with_id(EpisodeId(40));

        assert_eq!(
            render_episode(&episode),
            "Episode ID: 40\n\
             Anime ID: 3\n\
             Source ID: 52991\n\
             Episode Number: 12\n\
             Watch Link: https://catalog.test/animes/frieren/12\n\
             Download Link HD: N/A\n\
             Download Link SD: https://cdn.test/mp4/frieren-12.mp4\n\
             Temp: true\n"
        );
    }
}
