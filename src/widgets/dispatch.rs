use crate::widgets::binding::{WidgetBinding, WidgetKind};
use crate::widgets::gui::{Anim, GuiBackend, WidgetState};

/// C `atoi` semantics: optional leading whitespace and sign, then the longest run of decimal
/// digits. Anything unparsable is 0; out-of-range values saturate.
pub fn parse_int(s: &str) -> i32 {
    let s = s.trim_start();
    let (neg, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let mut acc: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        acc = acc * 10 + i64::from(b - b'0');
        if acc > i64::from(i32::MAX) + 1 {
            break;
        }
    }
    let signed = if neg { -acc } else { acc };
    signed.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Applies one set of formatted values to the bound widget. Caller holds the GUI mutex.
pub fn update_widget<G: GuiBackend + ?Sized>(gui: &mut G, binding: &WidgetBinding, values: &[String]) {
    let Some(first) = values.first() else {
        return;
    };
    let w = binding.widget;
    match &binding.kind {
        WidgetKind::Label => gui.set_label_text(w, first),
        WidgetKind::Chart { series } => {
            for (s, v) in series.iter().zip(values) {
                gui.chart_append_point(w, *s, parse_int(v));
            }
            gui.chart_refresh(w);
        }
        WidgetKind::Bar => gui.bar_set_value(w, parse_int(first), Anim::Off),
        WidgetKind::Meter { indicators } => {
            for (ind, v) in indicators.iter().zip(values) {
                gui.meter_set_indicator(w, *ind, parse_int(v));
            }
        }
        WidgetKind::Arc => gui.arc_set_value(w, parse_int(first)),
        WidgetKind::Slider => gui.slider_set_value(w, parse_int(first), Anim::Off),
        WidgetKind::Switch => match parse_int(first) {
            0 if gui.has_state(w, WidgetState::Checked) => gui.clear_state(w, WidgetState::Checked),
            1 if !gui.has_state(w, WidgetState::Checked) => gui.add_state(w, WidgetState::Checked),
            _ => {}
        },
    }
}
