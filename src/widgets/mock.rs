//! Recording GUI backend for tests.

use std::collections::{HashMap, HashSet};

use crate::widgets::gui::{
    Anim, GuiBackend, IndicatorHandle, SeriesHandle, WidgetHandle, WidgetState,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum GuiCall {
    LabelText(WidgetHandle, String),
    ChartPoint(WidgetHandle, SeriesHandle, i32),
    ChartRefresh(WidgetHandle),
    BarValue(WidgetHandle, i32, Anim),
    MeterIndicator(WidgetHandle, IndicatorHandle, i32),
    ArcValue(WidgetHandle, i32),
    SliderValue(WidgetHandle, i32, Anim),
    AddState(WidgetHandle, WidgetState),
    ClearState(WidgetHandle, WidgetState),
    CreateTopLabel(WidgetHandle),
    Delete(WidgetHandle),
    Style(WidgetHandle, String),
}

pub(crate) struct RecordingGui {
    pub calls: Vec<GuiCall>,
    pub labels: HashMap<WidgetHandle, String>,
    pub checked: HashSet<WidgetHandle>,
    pub live_top: HashSet<WidgetHandle>,
    next_handle: u64,
}

impl Default for RecordingGui {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            labels: HashMap::new(),
            checked: HashSet::new(),
            live_top: HashSet::new(),
            next_handle: 10_000,
        }
    }
}

impl RecordingGui {
    pub fn label(&self, w: WidgetHandle) -> Option<&str> {
        self.labels.get(&w).map(String::as_str)
    }

    /// Widget mutator calls only, without banner create/style/delete noise.
    pub fn widget_calls(&self) -> Vec<GuiCall> {
        self.calls
            .iter()
            .filter(|c| {
                !matches!(
                    c,
                    GuiCall::CreateTopLabel(_) | GuiCall::Delete(_) | GuiCall::Style(..)
                )
            })
            .cloned()
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&GuiCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    /// Simulates the toolkit destroying a widget behind the runtime's back.
    pub fn invalidate(&mut self, w: WidgetHandle) {
        self.live_top.remove(&w);
        self.labels.remove(&w);
    }
}

impl GuiBackend for RecordingGui {
    fn set_label_text(&mut self, label: WidgetHandle, text: &str) {
        self.labels.insert(label, text.to_string());
        self.calls.push(GuiCall::LabelText(label, text.to_string()));
    }

    fn chart_append_point(&mut self, chart: WidgetHandle, series: SeriesHandle, value: i32) {
        self.calls.push(GuiCall::ChartPoint(chart, series, value));
    }

    fn chart_refresh(&mut self, chart: WidgetHandle) {
        self.calls.push(GuiCall::ChartRefresh(chart));
    }

    fn bar_set_value(&mut self, bar: WidgetHandle, value: i32, anim: Anim) {
        self.calls.push(GuiCall::BarValue(bar, value, anim));
    }

    fn meter_set_indicator(&mut self, meter: WidgetHandle, indicator: IndicatorHandle, value: i32) {
        self.calls.push(GuiCall::MeterIndicator(meter, indicator, value));
    }

    fn arc_set_value(&mut self, arc: WidgetHandle, value: i32) {
        self.calls.push(GuiCall::ArcValue(arc, value));
    }

    fn slider_set_value(&mut self, slider: WidgetHandle, value: i32, anim: Anim) {
        self.calls.push(GuiCall::SliderValue(slider, value, anim));
    }

    fn has_state(&self, widget: WidgetHandle, state: WidgetState) -> bool {
        match state {
            WidgetState::Checked => self.checked.contains(&widget),
        }
    }

    fn add_state(&mut self, widget: WidgetHandle, state: WidgetState) {
        self.checked.insert(widget);
        self.calls.push(GuiCall::AddState(widget, state));
    }

    fn clear_state(&mut self, widget: WidgetHandle, state: WidgetState) {
        self.checked.remove(&widget);
        self.calls.push(GuiCall::ClearState(widget, state));
    }

    fn create_label_on_top_layer(&mut self) -> WidgetHandle {
        self.next_handle += 1;
        let w = WidgetHandle(self.next_handle);
        self.live_top.insert(w);
        self.calls.push(GuiCall::CreateTopLabel(w));
        w
    }

    fn delete_widget(&mut self, widget: WidgetHandle) {
        self.live_top.remove(&widget);
        self.labels.remove(&widget);
        self.calls.push(GuiCall::Delete(widget));
    }

    fn is_widget_valid(&self, widget: WidgetHandle) -> bool {
        self.live_top.contains(&widget) || self.labels.contains_key(&widget)
    }

    fn display_hres(&self) -> u32 {
        480
    }

    fn set_pos(&mut self, widget: WidgetHandle, x: i32, y: i32) {
        self.calls.push(GuiCall::Style(widget, format!("pos {x},{y}")));
    }

    fn set_size(&mut self, widget: WidgetHandle, width: u32, height: u32) {
        self.calls.push(GuiCall::Style(widget, format!("size {width}x{height}")));
    }

    fn set_label_scrolling(&mut self, label: WidgetHandle) {
        self.calls.push(GuiCall::Style(label, "scroll".into()));
    }

    fn set_text_color(&mut self, widget: WidgetHandle, rgb: u32) {
        self.calls.push(GuiCall::Style(widget, format!("color {rgb:06x}")));
    }

    fn set_border_width(&mut self, widget: WidgetHandle, px: u32) {
        self.calls.push(GuiCall::Style(widget, format!("border {px}")));
    }

    fn set_radius(&mut self, widget: WidgetHandle, px: u32) {
        self.calls.push(GuiCall::Style(widget, format!("radius {px}")));
    }

    fn set_text_font(&mut self, widget: WidgetHandle, font: &str) {
        self.calls.push(GuiCall::Style(widget, format!("font {font}")));
    }
}
