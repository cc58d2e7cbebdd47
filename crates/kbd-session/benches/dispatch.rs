use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use kbd_core::action::Action;
use kbd_core::flick::{FlickDirection, Point};
use kbd_core::key_model::{GeneralKeyModel, KeyGeometry, PressStyle, Variation};
use kbd_core::state::KeyboardLanguage;
use kbd_core::text::SurroundingText;
use kbd_core::timer::Timestamp;
use kbd_session::{ActionDispatcher, BufferEditor, KeyId, KeyboardSession};

fn typing_batch(len: usize) -> Vec<Action> {
    (0..len)
        .map(|i| {
            if i % 5 == 4 {
                Action::delete(1)
            } else {
                Action::input("a")
            }
        })
        .collect()
}

fn bench_register_actions(c: &mut Criterion) {
    let mut group = c.benchmark_group("register_actions");
    for len in [1usize, 16, 128] {
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, &len| {
            let batch = typing_batch(len);
            b.iter(|| {
                let mut d = ActionDispatcher::new(BufferEditor::new());
                d.state_mut().keyboard_language = KeyboardLanguage::EnUs;
                d.register_actions(batch.clone());
                d.state_refreshes()
            });
        });
    }
    group.finish();
}

fn bench_text_change(c: &mut Criterion) {
    let left = "今日はいい天気ですね。".repeat(20);
    let right = "明日も晴れるといいな。".repeat(20);
    c.bench_function("classify_cursor_move", |b| {
        b.iter(|| {
            let mut d = ActionDispatcher::new(BufferEditor::new());
            d.notify_something_will_change(SurroundingText::new(left.clone(), "", right.clone()));
            let mut moved = left.clone();
            moved.push('明');
            let rest: String = right.chars().skip(1).collect();
            d.notify_something_did_change(SurroundingText::new(moved, "", rest))
        });
    });
}

fn bench_flick_gesture(c: &mut Criterion) {
    let key = GeneralKeyModel::new("あ", vec![Action::input("あ")])
        .with_flick(FlickDirection::Left, Variation::new("い", vec![Action::input("い")]))
        .with_flick(FlickDirection::Top, Variation::new("う", vec![Action::input("う")]));
    c.bench_function("flick_gesture", |b| {
        b.iter(|| {
            let mut session = KeyboardSession::new(BufferEditor::new());
            session.register_key(
                "a",
                Box::new(key.clone()),
                PressStyle::Unified,
                KeyGeometry::default(),
            );
            let id = KeyId::from("a");
            for round in 0..10u64 {
                let t = round * 200;
                session.touch_down(&id, Point::new(0.0, 0.0), Timestamp::from_millis(t));
                session.touch_move(&id, Point::new(-30.0, 0.0), Timestamp::from_millis(t + 30));
                session.touch_up(&id, Point::new(-30.0, 0.0), Timestamp::from_millis(t + 60));
            }
            session.editor().text()
        });
    });
}

criterion_group!(
    benches,
    bench_register_actions,
    bench_text_change,
    bench_flick_gesture
);
criterion_main!(benches);
