use rl::reward_to_go;

#[test]
fn recurrence_holds() {
    let rewards = [3.0, -1.5, 0.25, 7.0, -2.0];
    let rtg = reward_to_go(&rewards, 0.80);

    let n = rewards.len();
    assert!((rtg[n - 1] - rewards[n - 1]).abs() < 1e-6);
    for i in 0..n - 1 {
        let expected = rewards[i] + 0.80 * rtg[i + 1];
        assert!((rtg[i] - expected).abs() < 1e-5, "index {i}");
    }
}

#[test]
fn worked_example_with_terminal_penalty() {
    // rewards [1, 1, 1] with the -500 terminal adjustment applied
    let rewards = [1.0, 1.0, -499.0];
    let rtg = reward_to_go(&rewards, 0.80);

    assert!((rtg[2] - -499.0).abs() < 1e-3);
    assert!((rtg[1] - -398.2).abs() < 1e-3);
    assert!((rtg[0] - -317.56).abs() < 1e-3);
}

#[test]
fn degenerate_lengths() {
    assert!(reward_to_go(&[], 0.80).is_empty());
    let single = reward_to_go(&[4.5], 0.80);
    assert!((single[0] - 4.5).abs() < 1e-6);
}
