use serde::{Deserialize, Serialize};

/// Subtitle output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtitleFormat {
    /// SubRip - the engine's native output format
    Srt,
    /// Advanced SubStation Alpha
    Ass,
}

impl SubtitleFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            SubtitleFormat::Srt => "srt",
            SubtitleFormat::Ass => "ass",
        }
    }
}

impl std::fmt::Display for SubtitleFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// One timed caption unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cue {
    /// 1-based sequence position, as written in the SRT file
    pub index: usize,

    /// Start offset in milliseconds
    pub start_ms: u64,

    /// End offset in milliseconds
    pub end_ms: u64,

    /// Display text; original line breaks are preserved as embedded newlines
    pub text: String,
}

/// Parse the full text of an SRT file into an ordered cue sequence.
///
/// Malformed blocks (missing or unparseable timing line, start after end) are
/// skipped rather than failing the whole parse. Cues whose text is empty or
/// whitespace-only are still emitted with their timing intact, so parsing is
/// lossless with respect to timing.
pub fn parse_srt(content: &str) -> Vec<Cue> {
    let mut cues = Vec::new();

    for block in content.replace("\r\n", "\n").split("\n\n") {
        let lines: Vec<&str> = block.lines().collect();

        // Locate the timing line; everything before it is the index,
        // everything after it is cue text.
        let timing_pos = match lines.iter().position(|l| l.contains("-->")) {
            Some(pos) => pos,
            None => continue,
        };

        let (start_ms, end_ms) = match parse_timing_line(lines[timing_pos]) {
            Some(range) => range,
            None => continue,
        };

        if start_ms > end_ms {
            tracing::warn!("Skipping SRT block with start after end: {}", lines[timing_pos]);
            continue;
        }

        let index = lines[..timing_pos]
            .iter()
            .rev()
            .find_map(|l| l.trim().parse::<usize>().ok())
            .unwrap_or(cues.len() + 1);

        let text = lines[timing_pos + 1..].join("\n");

        cues.push(Cue {
            index,
            start_ms,
            end_ms,
            text,
        });
    }

    cues
}

/// Serialize a cue sequence back into SRT text
pub fn format_srt(cues: &[Cue]) -> String {
    let mut out = String::new();

    for cue in cues {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            cue.index,
            format_srt_timestamp(cue.start_ms),
            format_srt_timestamp(cue.end_ms),
            cue.text
        ));
    }

    out
}

/// Convert SRT content into an ASS document.
///
/// Emits a minimal script/style preamble and one `Dialogue:` line per cue, in
/// input order. Timestamps are re-encoded at ASS's centisecond precision by
/// truncating the millisecond component, so the conversion is pure and
/// idempotent: converting the same input twice yields identical output.
pub fn convert_srt_to_ass(srt_content: &str) -> String {
    let cues = parse_srt(srt_content);

    let mut out = String::from(
        "[Script Info]\n\
         ScriptType: v4.00+\n\
         WrapStyle: 0\n\
         ScaledBorderAndShadow: yes\n\
         PlayResX: 1920\n\
         PlayResY: 1080\n\
         \n\
         [V4+ Styles]\n\
         Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, \
         Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, \
         Shadow, Alignment, MarginL, MarginR, MarginV, Encoding\n\
         Style: Default,Arial,48,&H00FFFFFF,&H000000FF,&H00000000,&H64000000,\
         0,0,0,0,100,100,0,0,1,2,1,2,30,30,40,1\n\
         \n\
         [Events]\n\
         Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\n",
    );

    for cue in &cues {
        out.push_str(&format!(
            "Dialogue: 0,{},{},Default,,0,0,0,,{}\n",
            format_ass_timestamp(cue.start_ms),
            format_ass_timestamp(cue.end_ms),
            cue.text.replace('\n', "\\N")
        ));
    }

    out
}

/// Parse an SRT timing line (`HH:MM:SS,mmm --> HH:MM:SS,mmm`)
fn parse_timing_line(line: &str) -> Option<(u64, u64)> {
    let (start, end) = line.split_once("-->")?;
    Some((
        parse_srt_timestamp(start.trim())?,
        parse_srt_timestamp(end.trim())?,
    ))
}

/// Parse an `HH:MM:SS,mmm` timestamp into milliseconds
pub fn parse_srt_timestamp(ts: &str) -> Option<u64> {
    let (clock, millis) = ts.split_once([',', '.'])?;
    let parts: Vec<&str> = clock.split(':').collect();
    if parts.len() != 3 {
        return None;
    }

    let hours: u64 = parts[0].trim().parse().ok()?;
    let minutes: u64 = parts[1].trim().parse().ok()?;
    let seconds: u64 = parts[2].trim().parse().ok()?;
    let millis: u64 = millis.trim().parse().ok()?;

    Some(((hours * 60 + minutes) * 60 + seconds) * 1000 + millis)
}

/// Format milliseconds as an SRT `HH:MM:SS,mmm` timestamp
pub fn format_srt_timestamp(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1000;
    let millis = ms % 1000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}

/// Format milliseconds as an ASS `H:MM:SS.cc` timestamp (centiseconds,
/// truncated)
pub fn format_ass_timestamp(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1000;
    let centis = (ms % 1000) / 10;

    format!("{}:{:02}:{:02}.{:02}", hours, minutes, seconds, centis)
}
