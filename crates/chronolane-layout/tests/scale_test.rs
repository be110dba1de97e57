use chrono::{TimeZone, Utc};
use chronolane_core::config::ScaleConfig;
use chronolane_core::{Event, RealTime};
use chronolane_layout::scale::{
    AxisOrientation, NarrativeScale, TickInterval, TimeScale, narrative_ticks, time_ticks,
};
use chronolane_layout::text::{DeterministicTextMeasurer, TextMeasurer, TextStyle};

fn ms(y: i32, m: u32, d: u32) -> i64 {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0)
        .single()
        .expect("valid date")
        .timestamp_millis()
}

#[test]
fn crowded_labels_are_hidden_but_ticks_remain() {
    let cfg = ScaleConfig::default();
    let measurer = DeterministicTextMeasurer::with_char_width_factor(cfg.char_width_factor);
    let scale = TimeScale::new(ms(2015, 1, 1), ms(2024, 1, 1), 0.0, 200.0, 1.0);
    assert_eq!(scale.tick_interval(), TickInterval::Year);

    let ticks = time_ticks(&scale, &cfg, &measurer);
    assert_eq!(ticks.len(), 10);
    assert!(ticks[0].label_visible);
    assert!(ticks.iter().any(|t| !t.label_visible));

    let style = TextStyle {
        font_size: cfg.label_font_size,
    };
    let visible: Vec<_> = ticks.iter().filter(|t| t.label_visible).collect();
    for pair in visible.windows(2) {
        let left = pair[0].position + measurer.measure(&pair[0].label, &style).width / 2.0;
        let right = pair[1].position - measurer.measure(&pair[1].label, &style).width / 2.0;
        assert!(right - left >= cfg.label_padding);
    }
}

#[test]
fn roomy_axis_shows_every_label() {
    let cfg = ScaleConfig::default();
    let measurer = DeterministicTextMeasurer::default();
    let scale = TimeScale::new(ms(2021, 1, 1), ms(2021, 12, 31), 0.0, 1200.0, 1.0);
    let ticks = time_ticks(&scale, &cfg, &measurer);
    assert_eq!(ticks.len(), 12);
    assert_eq!(ticks[0].label, "Jan 2021");
    assert!(ticks.iter().all(|t| t.label_visible));
}

#[test]
fn degenerate_domain_maps_to_the_midpoint() {
    let t = ms(2020, 5, 5);
    let scale = TimeScale::new(t, t, 100.0, 300.0, 2.0);
    assert!(scale.is_degenerate());
    assert_eq!(scale.map_ms(t), 200.0);
    assert_eq!(scale.map_ms(t + 86_400_000), 200.0);
    assert_eq!(scale.invert_ms(250.0), t);
    assert_eq!(scale.tick_values(), vec![t]);

    let narrative = NarrativeScale::new(3.0, 3.0, 0.0, 50.0);
    assert_eq!(narrative.map(3.0), 25.0);
    assert_eq!(narrative.invert(10.0), 3.0);
}

#[test]
fn vertical_narrative_ticks_compare_label_heights() {
    let cfg = ScaleConfig::default();
    let measurer = DeterministicTextMeasurer::default();
    let scale = NarrativeScale::new(0.0, 100.0, 0.0, 500.0);
    let ticks = narrative_ticks(&scale, &cfg, &measurer, AxisOrientation::Vertical);
    assert_eq!(
        ticks.iter().map(|t| t.value).collect::<Vec<_>>(),
        vec![0.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0]
    );
    // 50px apart, labels about 13px tall: nothing collides.
    assert!(ticks.iter().all(|t| t.label_visible));
}

#[test]
fn time_domain_spans_interval_endpoints_and_skips_untimed_events() {
    let day = |m: u32, d: u32| Utc.with_ymd_and_hms(2021, m, d, 0, 0, 0).single().expect("date");
    let events = vec![
        Event::new(0, 0.0).with_real_time(RealTime::instant(day(3, 1))),
        Event::new(1, 1.0),
        Event::new(2, 2.0).with_real_time(RealTime::interval(day(4, 10), day(6, 20))),
    ];
    let scale = TimeScale::from_events(&events, 0.0, 500.0, 1.0).expect("scale");
    assert_eq!(scale.domain_ms(), (ms(2021, 3, 1), ms(2021, 6, 20)));
    assert_eq!(scale.map(day(6, 20)), 500.0);

    assert!(TimeScale::from_events(&events[1..2], 0.0, 500.0, 1.0).is_none());
}
