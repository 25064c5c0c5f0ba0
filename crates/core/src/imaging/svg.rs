use crate::domain::player::{format_points, PlayerRecord};
use crate::domain::team::TeamSlots;
use crate::imaging::{CollageResult, Photo};
use anyhow::Context;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::PathBuf;

const WIDTH: u32 = 1080;
const HEADER_HEIGHT: u32 = 160;
const ROW_HEIGHT: u32 = 250;
const FOOTER_HEIGHT: u32 = 40;
const AVATAR_RADIUS: u32 = 70;

/// Renders the team onto a pitch, one row per position in roster order.
#[derive(Debug, Clone)]
pub struct SvgCollageRenderer {
    output_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct RenderedCollage {
    pub svg: String,
    pub width: u32,
    pub height: u32,
    pub photos_embedded: usize,
}

impl SvgCollageRenderer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn file_name(date: NaiveDate) -> String {
        format!("team_of_day_{}.svg", date.format("%Y-%m-%d"))
    }

    /// Returns `None` when there is nobody to draw.
    pub fn render(
        &self,
        photos: &BTreeMap<String, Photo>,
        players: &TeamSlots,
        date: NaiveDate,
        total_points: f64,
    ) -> Option<RenderedCollage> {
        if players.is_empty() {
            return None;
        }

        let rows = position_rows(players);
        let height = HEADER_HEIGHT + ROW_HEIGHT * rows.len() as u32 + FOOTER_HEIGHT;
        let mut photos_embedded = 0;

        let mut svg = String::new();
        // Writing into a String cannot fail.
        let _ = write!(
            svg,
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{height}" viewBox="0 0 {WIDTH} {height}">
<style>
.title {{ font: bold 48px sans-serif; fill: #ffffff; }}
.subtitle {{ font: 28px sans-serif; fill: #d7f5d7; }}
.name {{ font: bold 24px sans-serif; fill: #ffffff; }}
.meta {{ font: 20px sans-serif; fill: #d7f5d7; }}
.initials {{ font: bold 44px sans-serif; fill: #1b5e20; }}
</style>
<rect width="100%" height="100%" fill="#2e7d32"/>
<rect x="20" y="{pitch_y}" width="{pitch_w}" height="{pitch_h}" fill="none" stroke="#a5d6a7" stroke-width="3"/>
<text class="title" x="{center}" y="70" text-anchor="middle">Team of the Day</text>
<text class="subtitle" x="{center}" y="120" text-anchor="middle">{date} · {points} pts</text>
"##,
            pitch_y = HEADER_HEIGHT - 10,
            pitch_w = WIDTH - 40,
            pitch_h = ROW_HEIGHT * rows.len() as u32 + 10,
            center = WIDTH / 2,
            date = date.format("%Y-%m-%d"),
            points = format_points(total_points),
        );

        let mut clip_idx = 0;
        for (row_idx, (_, row)) in rows.iter().enumerate() {
            let cy = HEADER_HEIGHT + ROW_HEIGHT * row_idx as u32 + ROW_HEIGHT / 2 - 30;
            let n = row.len() as u32;
            for (i, (slot, player)) in row.iter().enumerate() {
                let cx = WIDTH * (i as u32 + 1) / (n + 1);
                clip_idx += 1;

                match photos.get(&player.id) {
                    Some(photo) => {
                        photos_embedded += 1;
                        let _ = write!(
                            svg,
                            r#"<clipPath id="clip-{clip_idx}"><circle cx="{cx}" cy="{cy}" r="{r}"/></clipPath>
<image href="data:{ct};base64,{data}" x="{x}" y="{y}" width="{d}" height="{d}" preserveAspectRatio="xMidYMid slice" clip-path="url(#clip-{clip_idx})"/>
"#,
                            r = AVATAR_RADIUS,
                            ct = xml_escape(&photo.content_type),
                            data = BASE64.encode(&photo.bytes),
                            x = cx.saturating_sub(AVATAR_RADIUS),
                            y = cy.saturating_sub(AVATAR_RADIUS),
                            d = AVATAR_RADIUS * 2,
                        );
                    }
                    None => {
                        let _ = write!(
                            svg,
                            r##"<circle cx="{cx}" cy="{cy}" r="{r}" fill="#e8f5e9"/>
<text class="initials" x="{cx}" y="{ty}" text-anchor="middle">{initials}</text>
"##,
                            r = AVATAR_RADIUS,
                            ty = cy + 15,
                            initials = xml_escape(&initials(player.name())),
                        );
                    }
                }

                let _ = write!(
                    svg,
                    r##"<circle cx="{cx}" cy="{cy}" r="{r}" fill="none" stroke="#ffffff" stroke-width="4"/>
<text class="name" x="{cx}" y="{name_y}" text-anchor="middle">{name}</text>
<text class="meta" x="{cx}" y="{meta_y}" text-anchor="middle">{slot} · {points}</text>
"##,
                    r = AVATAR_RADIUS,
                    name_y = cy + AVATAR_RADIUS + 32,
                    meta_y = cy + AVATAR_RADIUS + 58,
                    name = xml_escape(player.name()),
                    slot = xml_escape(slot),
                    points = format_points(player.total_points()),
                );
            }
        }

        svg.push_str("</svg>\n");

        Some(RenderedCollage {
            svg,
            width: WIDTH,
            height,
            photos_embedded,
        })
    }

    pub async fn render_to_file(
        &self,
        photos: &BTreeMap<String, Photo>,
        players: &TeamSlots,
        date: NaiveDate,
        total_points: f64,
    ) -> anyhow::Result<Option<CollageResult>> {
        let Some(rendered) = self.render(photos, players, date, total_points) else {
            tracing::warn!(%date, "no players to render; skipping collage");
            return Ok(None);
        };

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| format!("failed to create {}", self.output_dir.display()))?;

        let path = self.output_dir.join(Self::file_name(date));
        tokio::fs::write(&path, rendered.svg.as_bytes())
            .await
            .with_context(|| format!("failed to write collage {}", path.display()))?;

        tracing::info!(
            %date,
            path = %path.display(),
            photos_embedded = rendered.photos_embedded,
            players = players.len(),
            "collage written"
        );

        Ok(Some(CollageResult {
            path,
            width: rendered.width,
            height: rendered.height,
            photos_embedded: rendered.photos_embedded,
        }))
    }
}

type Row<'a> = Vec<(&'a str, &'a PlayerRecord)>;

fn position_rows(players: &TeamSlots) -> Vec<(String, Row<'_>)> {
    let mut rows: Vec<(String, Row<'_>)> = Vec::new();
    for (slot, player) in players.iter() {
        let label = player
            .info
            .position
            .clone()
            .unwrap_or_else(|| slot.trim_end_matches(|c: char| c.is_ascii_digit()).to_string());
        match rows.iter_mut().find(|(l, _)| *l == label) {
            Some((_, row)) => row.push((slot, player)),
            None => rows.push((label, vec![(slot, player)])),
        }
    }
    rows
}

fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|part| part.chars().next())
        .take(2)
        .flat_map(char::to_uppercase)
        .collect()
}

fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
