use std::collections::BTreeMap;
use std::fmt::{self, Write as _};

use super::{
    ActionArea, EvaluationPanel, HeaderView, Notice, NoticeLevel, PipelineScreen, RibbonSegment,
    SegmentState, TimelineRow,
};

/// Named areas of the pipeline screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Region {
    Header,
    StageRibbon,
    ActionPanel,
    EvaluationPanel,
    Timeline,
    Notice,
}

impl Region {
    /// Regions a surface must expose before a renderer can be bound to it.
    pub const REQUIRED: [Region; 5] = [
        Region::Header,
        Region::StageRibbon,
        Region::ActionPanel,
        Region::EvaluationPanel,
        Region::Notice,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Region::Header => "header",
            Region::StageRibbon => "stage-ribbon",
            Region::ActionPanel => "action-panel",
            Region::EvaluationPanel => "evaluation-panel",
            Region::Timeline => "timeline",
            Region::Notice => "notice",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What gets written into a region on each render.
#[derive(Debug, Clone, PartialEq)]
pub enum RegionContent {
    Header(HeaderView),
    StageRibbon(Vec<RibbonSegment>),
    ActionPanel(ActionArea),
    EvaluationPanel(EvaluationPanel),
    Timeline(Vec<TimelineRow>),
    Notice(Option<Notice>),
}

/// A rendering target made of named regions.
///
/// `replace` overwrites a region wholesale; implementations must not accumulate content.
pub trait RenderSurface {
    fn has_region(&self, region: Region) -> bool;
    fn replace(&mut self, region: Region, content: RegionContent);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BindingError {
    #[error("surface is missing the '{0}' region")]
    MissingRegion(Region),
}

/// Writes composed screens into a surface whose regions were checked at bind time.
#[derive(Debug)]
pub struct PipelineRenderer<S> {
    surface: S,
    timeline: bool,
}

impl<S: RenderSurface> PipelineRenderer<S> {
    pub fn bind(surface: S) -> Result<Self, BindingError> {
        if let Some(missing) = Region::REQUIRED
            .into_iter()
            .find(|region| !surface.has_region(*region))
        {
            return Err(BindingError::MissingRegion(missing));
        }

        let timeline = surface.has_region(Region::Timeline);
        Ok(Self { surface, timeline })
    }

    pub fn render(&mut self, screen: &PipelineScreen) {
        self.surface
            .replace(Region::Header, RegionContent::Header(screen.header.clone()));
        self.surface.replace(
            Region::StageRibbon,
            RegionContent::StageRibbon(screen.ribbon.clone()),
        );
        self.surface.replace(
            Region::ActionPanel,
            RegionContent::ActionPanel(screen.actions.clone()),
        );
        self.surface.replace(
            Region::EvaluationPanel,
            RegionContent::EvaluationPanel(screen.evaluation.clone()),
        );
        if self.timeline {
            self.surface.replace(
                Region::Timeline,
                RegionContent::Timeline(screen.timeline.clone()),
            );
        }
        self.surface
            .replace(Region::Notice, RegionContent::Notice(screen.notice.clone()));
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }
}

/// Plain-text surface used by the console and by tests.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSurface {
    regions: BTreeMap<Region, Option<RegionContent>>,
}

impl Default for TextSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl TextSurface {
    /// A surface exposing every region, timeline included.
    pub fn new() -> Self {
        let regions = Region::REQUIRED
            .into_iter()
            .chain([Region::Timeline])
            .map(|region| (region, None))
            .collect();
        Self { regions }
    }

    pub fn without(mut self, region: Region) -> Self {
        self.regions.remove(&region);
        self
    }

    pub fn content(&self, region: Region) -> Option<&RegionContent> {
        self.regions.get(&region).and_then(Option::as_ref)
    }

    pub fn action_area(&self) -> Option<&ActionArea> {
        match self.content(Region::ActionPanel) {
            Some(RegionContent::ActionPanel(area)) => Some(area),
            _ => None,
        }
    }

    pub fn evaluation_panel(&self) -> Option<&EvaluationPanel> {
        match self.content(Region::EvaluationPanel) {
            Some(RegionContent::EvaluationPanel(panel)) => Some(panel),
            _ => None,
        }
    }

    pub fn header(&self) -> Option<&HeaderView> {
        match self.content(Region::Header) {
            Some(RegionContent::Header(header)) => Some(header),
            _ => None,
        }
    }

    pub fn notice(&self) -> Option<&Notice> {
        match self.content(Region::Notice) {
            Some(RegionContent::Notice(notice)) => notice.as_ref(),
            _ => None,
        }
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for content in self.regions.values().flatten() {
            write_region(&mut out, content);
        }
        out
    }
}

impl RenderSurface for TextSurface {
    fn has_region(&self, region: Region) -> bool {
        self.regions.contains_key(&region)
    }

    fn replace(&mut self, region: Region, content: RegionContent) {
        if let Some(slot) = self.regions.get_mut(&region) {
            *slot = Some(content);
        }
    }
}

impl fmt::Display for TextSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

// `fmt::Write` for `String` is infallible.
fn write_region(out: &mut String, content: &RegionContent) {
    match content {
        RegionContent::Header(header) => {
            let _ = writeln!(out, "{} [{}] {}", header.full_name, header.stage_badge, header.status);
            if !header.role.is_empty() || !header.email.is_empty() {
                let _ = writeln!(out, "  {} <{}>", header.role, header.email);
            }
            if let Some(date) = header.interview_date {
                let _ = writeln!(out, "  interview: {}", date.format("%Y-%m-%d %H:%M UTC"));
            }
            if let Some(reviewer) = &header.assigned_reviewer {
                let _ = writeln!(out, "  reviewer: {reviewer}");
            }
        }
        RegionContent::StageRibbon(segments) => {
            let ribbon: Vec<String> = segments
                .iter()
                .map(|segment| {
                    let marker = match segment.state {
                        SegmentState::Completed => "x",
                        SegmentState::Active => ">",
                        SegmentState::Upcoming => " ",
                    };
                    format!("[{marker}] {}", segment.stage.title())
                })
                .collect();
            let _ = writeln!(out, "{}", ribbon.join("  "));
        }
        RegionContent::ActionPanel(ActionArea::Closed { message, .. }) => {
            let _ = writeln!(out, "{message}");
        }
        RegionContent::ActionPanel(ActionArea::Controls { controls }) => {
            if controls.is_empty() {
                let _ = writeln!(out, "actions: none");
            }
            for control in controls {
                let state = if control.in_flight {
                    "working"
                } else if control.enabled {
                    "ready"
                } else {
                    "disabled"
                };
                let _ = writeln!(out, "  ({}) {} [{state}]", control.action, control.label);
            }
        }
        RegionContent::EvaluationPanel(panel) => {
            if !panel.scored {
                return;
            }
            let lock = if panel.finalized { " (finalized)" } else { "" };
            let _ = writeln!(out, "{}{lock}", panel.title);
            for row in &panel.rows {
                let score = row
                    .score
                    .map(|score| score.value().to_string())
                    .unwrap_or_else(|| "-".to_string());
                let _ = write!(out, "  {:<20} {score}", row.label);
                if !row.notes.is_empty() {
                    let _ = write!(out, "  {}", row.notes);
                }
                out.push('\n');
            }
            let _ = writeln!(out, "  score: {}", panel.score_label);
        }
        RegionContent::Timeline(rows) => {
            for row in rows {
                let _ = writeln!(
                    out,
                    "  {} {}: {} -> {} by {} ({})",
                    row.at.format("%Y-%m-%d %H:%M"),
                    row.action,
                    row.from,
                    row.to,
                    row.performed_by,
                    row.duration
                );
            }
        }
        RegionContent::Notice(Some(notice)) => {
            let prefix = match notice.level {
                NoticeLevel::Info => "info",
                NoticeLevel::Error => "error",
            };
            let _ = writeln!(out, "{prefix}: {}", notice.message);
        }
        RegionContent::Notice(None) => {}
    }
}
