use anyhow::{Context, Result, bail};
use ratatui::style::{Color, Modifier, Style};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Style configuration constructed once at startup and passed by reference
/// into every render path. Nothing reads ambient global styling.
#[derive(Debug, Clone)]
pub struct Theme {
    pub border: Color,
    pub title: Style,
    pub tab: Style,
    pub tab_selected: Style,
    pub selected_row: Style,
    pub search_highlight: Style,
    pub search_mode: Style,
    pub error: Style,
    pub hint: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            border: Color::Rgb(140, 156, 178),
            title: Style::default().add_modifier(Modifier::BOLD),
            tab: Style::default().fg(Color::Rgb(140, 156, 178)),
            tab_selected: Style::default()
                .fg(Color::Rgb(52, 211, 153))
                .add_modifier(Modifier::BOLD),
            selected_row: Style::default()
                .bg(Color::Rgb(16, 27, 44))
                .add_modifier(Modifier::BOLD),
            search_highlight: Style::default()
                .bg(Color::Rgb(251, 191, 36))
                .fg(Color::Black),
            search_mode: Style::default().fg(Color::Rgb(140, 156, 178)),
            error: Style::default().fg(Color::Rgb(248, 113, 113)),
            hint: Style::default().fg(Color::Rgb(140, 156, 178)),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ThemeFile {
    border: Option<String>,
    title: Option<String>,
    tab: Option<String>,
    tab_selected: Option<String>,
    selected_row_background: Option<String>,
    search_highlight_background: Option<String>,
    search_mode: Option<String>,
    error: Option<String>,
    hint: Option<String>,
}

impl Theme {
    /// Loads a theme overlay from a YAML file; unset fields keep defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading theme file {}", path.display()))?;
        let file: ThemeFile = serde_yaml::from_str(&raw)
            .with_context(|| format!("parsing theme file {}", path.display()))?;

        let mut theme = Self::default();
        if let Some(color) = file.border {
            theme.border = parse_color(&color)?;
        }
        if let Some(color) = file.title {
            theme.title = theme.title.fg(parse_color(&color)?);
        }
        if let Some(color) = file.tab {
            theme.tab = Style::default().fg(parse_color(&color)?);
        }
        if let Some(color) = file.tab_selected {
            theme.tab_selected = Style::default()
                .fg(parse_color(&color)?)
                .add_modifier(Modifier::BOLD);
        }
        if let Some(color) = file.selected_row_background {
            theme.selected_row = Style::default()
                .bg(parse_color(&color)?)
                .add_modifier(Modifier::BOLD);
        }
        if let Some(color) = file.search_highlight_background {
            theme.search_highlight = Style::default()
                .bg(parse_color(&color)?)
                .fg(Color::Black);
        }
        if let Some(color) = file.search_mode {
            theme.search_mode = Style::default().fg(parse_color(&color)?);
        }
        if let Some(color) = file.error {
            theme.error = Style::default().fg(parse_color(&color)?);
        }
        if let Some(color) = file.hint {
            theme.hint = Style::default().fg(parse_color(&color)?);
        }
        Ok(theme)
    }
}

fn parse_color(raw: &str) -> Result<Color> {
    let trimmed = raw.trim();
    if let Some(hex) = trimmed.strip_prefix('#') {
        if hex.len() != 6 {
            bail!("color {raw:?} is not a #rrggbb value");
        }
        let red = u8::from_str_radix(&hex[0..2], 16)
            .with_context(|| format!("parsing color {raw:?}"))?;
        let green = u8::from_str_radix(&hex[2..4], 16)
            .with_context(|| format!("parsing color {raw:?}"))?;
        let blue = u8::from_str_radix(&hex[4..6], 16)
            .with_context(|| format!("parsing color {raw:?}"))?;
        return Ok(Color::Rgb(red, green, blue));
    }

    match trimmed.to_ascii_lowercase().as_str() {
        "black" => Ok(Color::Black),
        "red" => Ok(Color::Red),
        "green" => Ok(Color::Green),
        "yellow" => Ok(Color::Yellow),
        "blue" => Ok(Color::Blue),
        "magenta" => Ok(Color::Magenta),
        "cyan" => Ok(Color::Cyan),
        "gray" | "grey" => Ok(Color::Gray),
        "white" => Ok(Color::White),
        _ => bail!("unknown color name {raw:?}"),
    }
}
