use super::*;
use crate::snapshot::model::{InputKind, Overlay, Placement, Snapshot};

fn key(n: u64) -> String {
    format!("k{n}")
}

fn video(n: u64, title: &str) -> Input {
    Input::new(n, key(n), title, InputKind::Video)
}

fn bus(n: u64, active: u64) -> Input {
    Input::new(n, key(n), format!("MIX{n}"), InputKind::Mix).with_active(active)
}

fn full(n: u64) -> Overlay {
    Overlay::full_frame(key(n))
}

fn pip(n: u64) -> Overlay {
    Overlay::bounded(
        key(n),
        Placement {
            x: 0.7,
            y: 0.7,
            width: 0.25,
            height: 0.25,
        },
    )
}

fn numbers(set: &VisibleSet<'_>) -> Vec<String> {
    set.iter().map(|i| i.number().to_string()).collect()
}

fn resolve(snap: &Snapshot, start: u64) -> Vec<String> {
    let index = SnapshotIndex::build(snap);
    numbers(&resolve_visible(&index, &InputNumber::from(start)))
}

#[test]
fn bus_passes_through_to_selected_input() {
    let snap = Snapshot::new(vec![video(1, "CAM1"), bus(2, 1)]);
    assert_eq!(resolve(&snap, 2), vec!["1"]);
}

#[test]
fn full_frame_overlay_hides_lower_overlays_but_not_base() {
    let snap = Snapshot::new(vec![
        video(1, "CAM1").with_overlay(full(4)).with_overlay(full(3)),
        video(3, "SLIDES"),
        video(4, "HIDDEN"),
    ]);
    assert_eq!(resolve(&snap, 1), vec!["1", "3"]);
}

#[test]
fn bounded_overlay_never_hides_layers_beneath() {
    let snap = Snapshot::new(vec![
        video(1, "CAM1").with_overlay(full(3)).with_overlay(pip(4)),
        video(3, "SLIDES"),
        video(4, "SPEAKER"),
    ]);
    assert_eq!(resolve(&snap, 1), vec!["1", "3", "4"]);
}

#[test]
fn nested_buses_are_chased_to_the_base_input() {
    let snap = Snapshot::new(vec![video(1, "CAM1"), bus(2, 1), bus(5, 2)]);
    assert_eq!(resolve(&snap, 5), vec!["1"]);
}

#[test]
fn bus_cycle_terminates() {
    let snap = Snapshot::new(vec![bus(2, 5), bus(5, 2)]);
    assert!(resolve(&snap, 2).is_empty());
    assert!(resolve(&snap, 5).is_empty());
}

#[test]
fn bus_cycle_keeps_overlays_found_on_the_way() {
    let snap = Snapshot::new(vec![
        bus(2, 5).with_overlay(pip(7)),
        bus(5, 2),
        video(7, "BUG"),
    ]);
    assert_eq!(resolve(&snap, 2), vec!["7"]);
}

#[test]
fn overlay_cycle_terminates() {
    let snap = Snapshot::new(vec![
        video(1, "A").with_overlay(full(2)),
        video(2, "B").with_overlay(full(1)),
        video(3, "SELF").with_overlay(full(3)),
    ]);
    assert_eq!(resolve(&snap, 1), vec!["1", "2"]);
    assert_eq!(resolve(&snap, 3), vec!["3"]);
}

#[test]
fn long_cyclic_chain_terminates() {
    let n = 2_000u64;
    let mut inputs: Vec<Input> = (1..=n)
        .map(|i| bus(i, if i == n { 1 } else { i + 1 }).with_overlay(full(i)))
        .collect();
    inputs.push(video(n + 1, "TAIL"));
    let snap = Snapshot::new(inputs);
    assert!(resolve(&snap, 1).is_empty());
}

#[test]
fn unknown_start_is_empty() {
    let snap = Snapshot::new(vec![video(1, "CAM1")]);
    assert!(resolve(&snap, 42).is_empty());
}

#[test]
fn dangling_bus_target_contributes_nothing() {
    let snap = Snapshot::new(vec![bus(2, 9), video(1, "CAM1")]);
    assert!(resolve(&snap, 2).is_empty());

    let no_target = Snapshot::new(vec![Input::new(2u64, "k2", "MIX", InputKind::Mix)]);
    assert!(resolve(&no_target, 2).is_empty());
}

#[test]
fn dangling_overlay_does_not_disturb_siblings() {
    let snap = Snapshot::new(vec![
        video(1, "CAM1")
            .with_overlay(full(3))
            .with_overlay(full(99))
            .with_overlay(pip(4)),
        video(3, "SLIDES"),
        video(4, "SPEAKER"),
    ]);
    assert_eq!(resolve(&snap, 1), vec!["1", "3", "4"]);
}

#[test]
fn non_visual_inputs_never_count_as_base() {
    let snap = Snapshot::new(vec![
        Input::new(1u64, key(1), "EMPTY", InputKind::Placeholder).with_overlay(pip(3)),
        Input::new(2u64, key(2), "MUSIC", InputKind::Audio),
        video(3, "LOGO"),
        bus(4, 1),
        bus(5, 2),
        video(6, "CAM").with_overlay(full(2)),
    ]);
    assert_eq!(resolve(&snap, 4), vec!["3"]);
    assert!(resolve(&snap, 5).is_empty());
    assert_eq!(resolve(&snap, 6), vec!["6"]);
}

#[test]
fn empty_full_frame_overlay_does_not_occlude() {
    let snap = Snapshot::new(vec![
        video(1, "CAM1").with_overlay(pip(4)).with_overlay(full(2)),
        Input::new(2u64, key(2), "EMPTY", InputKind::Placeholder),
        video(4, "SPEAKER"),
    ]);
    assert_eq!(resolve(&snap, 1), vec!["1", "4"]);
}

#[test]
fn bus_overlays_count_independently_of_selection() {
    let snap = Snapshot::new(vec![
        video(1, "CAM1"),
        bus(2, 1).with_overlay(pip(3)),
        video(3, "LOGO"),
    ]);
    assert_eq!(resolve(&snap, 2), vec!["1", "3"]);
}

#[test]
fn full_frame_bus_overlay_does_not_hide_selected_input() {
    let snap = Snapshot::new(vec![
        video(1, "CAM1"),
        bus(2, 1).with_overlay(pip(4)).with_overlay(full(3)),
        video(3, "SLIDES"),
        video(4, "HIDDEN"),
    ]);
    assert_eq!(resolve(&snap, 2), vec!["1", "3"]);
}

#[test]
fn already_counted_full_frame_overlay_still_occludes() {
    let snap = Snapshot::new(vec![
        video(1, "CAM1").with_overlay(pip(4)).with_overlay(full(3)),
        bus(2, 1).with_overlay(full(3)),
        video(3, "SLIDES"),
        video(4, "HIDDEN"),
    ]);
    assert_eq!(resolve(&snap, 2), vec!["1", "3"]);
}

#[test]
fn overlay_target_can_be_a_bus() {
    let snap = Snapshot::new(vec![
        video(1, "CAM1").with_overlay(pip(5)),
        video(2, "CAM2"),
        bus(5, 2),
    ]);
    assert_eq!(resolve(&snap, 1), vec!["1", "2"]);
}

#[test]
fn resolution_is_deterministic() {
    let snap = Snapshot::new(vec![
        video(1, "CAM1").with_overlay(full(3)).with_overlay(pip(4)),
        bus(2, 1),
        video(3, "SLIDES"),
        video(4, "SPEAKER"),
    ]);
    let index = SnapshotIndex::build(&snap);
    let a = resolve_visible(&index, &InputNumber::from(2u64));
    let b = resolve_visible(&index, &InputNumber::from(2u64));
    assert_eq!(a, b);
    assert_eq!(a.len(), 3);
}

#[test]
fn program_resolution_follows_snapshot_selector() {
    let snap = Snapshot::new(vec![video(1, "CAM1"), bus(2, 1)]).with_program(2u64);
    let index = SnapshotIndex::build(&snap);
    let set = resolve_program(&index);
    assert_eq!(set.titles().into_iter().collect::<Vec<_>>(), vec!["CAM1"]);
    assert!(set.contains_number(&InputNumber::from(1u64)));

    let no_program = Snapshot::new(vec![video(1, "CAM1")]);
    let index = SnapshotIndex::build(&no_program);
    assert!(resolve_program(&index).is_empty());
}

#[test]
fn one_index_serves_concurrent_resolutions() {
    let snap = Snapshot::new(vec![
        video(1, "CAM1"),
        video(2, "CAM2").with_overlay(pip(1)),
        bus(3, 1),
        bus(4, 2),
    ]);
    let index = SnapshotIndex::build(&snap);

    let (a, b) = std::thread::scope(|s| {
        let a = s.spawn(|| numbers(&resolve_visible(&index, &InputNumber::from(3u64))));
        let b = s.spawn(|| numbers(&resolve_visible(&index, &InputNumber::from(4u64))));
        (a.join().unwrap(), b.join().unwrap())
    });
    assert_eq!(a, vec!["1"]);
    assert_eq!(b, vec!["1", "2"]);
}

#[test]
fn position_entry_point_matches_number_entry_point() {
    let snap = Snapshot::new(vec![video(1, "CAM1"), bus(2, 1)]);
    let index = SnapshotIndex::build(&snap);
    let by_number = resolve_visible(&index, &InputNumber::from(2u64));
    let by_idx = resolve_visible_at(&index, InputIdx(1));
    assert_eq!(by_number, by_idx);
    assert!(resolve_visible_at(&index, InputIdx(7)).is_empty());
}
