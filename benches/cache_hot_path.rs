use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;

use freemaster_rt::config::CacheConfig;
use freemaster_rt::widgets::{
    Anim, GuiBackend, IndicatorHandle, ScreenHandle, SeriesHandle, WidgetBinding, WidgetCache,
    WidgetHandle, WidgetKind, WidgetState, update_widget,
};

/// Backend that only sinks values so the bench measures cache and dispatch.
#[derive(Default)]
struct NullGui {
    sink: i64,
}

impl GuiBackend for NullGui {
    fn set_label_text(&mut self, _label: WidgetHandle, text: &str) {
        self.sink += text.len() as i64;
    }
    fn chart_append_point(&mut self, _chart: WidgetHandle, _series: SeriesHandle, value: i32) {
        self.sink += i64::from(value);
    }
    fn chart_refresh(&mut self, _chart: WidgetHandle) {}
    fn bar_set_value(&mut self, _bar: WidgetHandle, value: i32, _anim: Anim) {
        self.sink += i64::from(value);
    }
    fn meter_set_indicator(&mut self, _m: WidgetHandle, _i: IndicatorHandle, value: i32) {
        self.sink += i64::from(value);
    }
    fn arc_set_value(&mut self, _arc: WidgetHandle, value: i32) {
        self.sink += i64::from(value);
    }
    fn slider_set_value(&mut self, _slider: WidgetHandle, value: i32, _anim: Anim) {
        self.sink += i64::from(value);
    }
    fn has_state(&self, _widget: WidgetHandle, _state: WidgetState) -> bool {
        false
    }
    fn add_state(&mut self, _widget: WidgetHandle, _state: WidgetState) {}
    fn clear_state(&mut self, _widget: WidgetHandle, _state: WidgetState) {}
    fn create_label_on_top_layer(&mut self) -> WidgetHandle {
        WidgetHandle(0)
    }
    fn delete_widget(&mut self, _widget: WidgetHandle) {}
    fn is_widget_valid(&self, _widget: WidgetHandle) -> bool {
        true
    }
    fn display_hres(&self) -> u32 {
        480
    }
    fn set_pos(&mut self, _widget: WidgetHandle, _x: i32, _y: i32) {}
    fn set_size(&mut self, _widget: WidgetHandle, _width: u32, _height: u32) {}
    fn set_label_scrolling(&mut self, _label: WidgetHandle) {}
    fn set_text_color(&mut self, _widget: WidgetHandle, _rgb: u32) {}
    fn set_border_width(&mut self, _widget: WidgetHandle, _px: u32) {}
    fn set_radius(&mut self, _widget: WidgetHandle, _px: u32) {}
}

fn bindings(n: u64) -> Vec<Arc<WidgetBinding>> {
    (0..n)
        .map(|i| {
            let kind = match i % 3 {
                0 => WidgetKind::Label,
                1 => WidgetKind::Bar,
                _ => WidgetKind::Arc,
            };
            Arc::new(
                WidgetBinding::new(WidgetHandle(i), kind, vec!["v".into()], ScreenHandle(0))
                    .unwrap(),
            )
        })
        .collect()
}

pub fn bench_put_and_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("widget_cache_put_drain");
    let cache = WidgetCache::new(&CacheConfig::default());
    let mut gui = NullGui::default();

    // 64 bindings overflow the default capacity and exercise eviction.
    for &n in &[8_u64, 32, 64] {
        let bound = bindings(n);
        group.bench_function(BenchmarkId::from_parameter(n), |b| {
            b.iter(|| {
                for (i, binding) in bound.iter().enumerate() {
                    cache.put(binding, vec![i.to_string()]);
                }
                let stats = cache.drain_with(|binding, values| {
                    update_widget(&mut gui, binding, values)
                });
                black_box(stats);
            });
        });
    }

    group.finish();
    black_box(gui.sink);
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .warm_up_time(Duration::from_millis(500))
        .measurement_time(Duration::from_secs(3));
    targets = bench_put_and_drain
}
criterion_main!(benches);
