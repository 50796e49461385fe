/// Opaque handle of a widget owned by the GUI toolkit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetHandle(pub u64);

/// Opaque handle of a screen (root widget). Tasks are cleared per screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScreenHandle(pub u64);

/// One data series of a chart widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeriesHandle(pub u64);

/// One needle/arc indicator of a meter widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndicatorHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetState {
    Checked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Anim {
    Off,
    On,
}

/// Capabilities the runtime needs from the GUI toolkit.
///
/// Every method is called with the GUI mutex held, so implementations need no locking of
/// their own.
pub trait GuiBackend: Send {
    fn set_label_text(&mut self, label: WidgetHandle, text: &str);
    fn chart_append_point(&mut self, chart: WidgetHandle, series: SeriesHandle, value: i32);
    fn chart_refresh(&mut self, chart: WidgetHandle);
    fn bar_set_value(&mut self, bar: WidgetHandle, value: i32, anim: Anim);
    fn meter_set_indicator(&mut self, meter: WidgetHandle, indicator: IndicatorHandle, value: i32);
    fn arc_set_value(&mut self, arc: WidgetHandle, value: i32);
    fn slider_set_value(&mut self, slider: WidgetHandle, value: i32, anim: Anim);

    fn has_state(&self, widget: WidgetHandle, state: WidgetState) -> bool;
    fn add_state(&mut self, widget: WidgetHandle, state: WidgetState);
    fn clear_state(&mut self, widget: WidgetHandle, state: WidgetState);

    /// Creates an empty label on the layer drawn above every screen.
    fn create_label_on_top_layer(&mut self) -> WidgetHandle;
    fn delete_widget(&mut self, widget: WidgetHandle);
    fn is_widget_valid(&self, widget: WidgetHandle) -> bool;
    /// Horizontal resolution of the default display, in pixels.
    fn display_hres(&self) -> u32;

    fn set_pos(&mut self, widget: WidgetHandle, x: i32, y: i32);
    fn set_size(&mut self, widget: WidgetHandle, width: u32, height: u32);
    /// Long text scrolls horizontally instead of wrapping.
    fn set_label_scrolling(&mut self, label: WidgetHandle);
    /// `rgb` is 0xRRGGBB.
    fn set_text_color(&mut self, widget: WidgetHandle, rgb: u32);
    fn set_border_width(&mut self, widget: WidgetHandle, px: u32);
    fn set_radius(&mut self, widget: WidgetHandle, px: u32);
    fn set_text_font(&mut self, _widget: WidgetHandle, _font: &str) {}
}
