use kernel_terms::{
    decode, encode, free_var_range, has_free_var, is_arrow, live_cells, mk_app, mk_arrow,
    mk_constant, mk_lambda, mk_pi, mk_var, MacroRegistry, Term,
};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// `(((f #0) #1) ... #n-1)`
fn app_chain(n: u32) -> Term {
    let mut t = mk_constant("f", []);
    for i in 0..n {
        t = mk_app(t, mk_var(i));
    }
    t
}

#[test]
fn dropping_a_deep_chain_reclaims_every_cell() {
    init();
    let baseline = live_cells();
    let t = app_chain(100_000);
    // the constant, 100000 variables and 100000 applications
    assert_eq!(live_cells(), baseline + 200_001);
    assert_eq!(t.depth(), 100_001);
    drop(t);
    assert_eq!(live_cells(), baseline);
}

/// `(#0 (#1 ... (#n-1 a)))`
fn right_chain(n: u32) -> Term {
    let mut t = mk_constant("a", []);
    for i in (0..n).rev() {
        t = mk_app(mk_var(i), t);
    }
    t
}

#[test]
fn right_nested_applications() {
    init();
    let baseline = live_cells();
    let t = right_chain(100_000);
    assert_eq!(live_cells(), baseline + 200_001);
    assert_eq!(t.depth(), 100_001);
    assert_eq!(free_var_range(&t), 100_000);

    let text = t.to_string();
    assert!(text.starts_with("(#0 (#1 (#2 "));
    assert!(text.contains("(#99998 (#99999 a))"));

    let back = decode(&encode(&t).unwrap(), &MacroRegistry::new()).unwrap();
    assert_eq!(back, t);
    assert!(back.check_metadata().is_ok());
    drop(back);
    drop(t);
    assert_eq!(live_cells(), baseline);
}

#[test]
fn shared_parts_survive_teardown() {
    let baseline = live_cells();
    let inner = app_chain(50_000);
    let outer = mk_lambda("x", mk_constant("nat", []), inner.clone());
    drop(outer);
    // only the constant and the lambda went away
    assert_eq!(live_cells(), baseline + 100_001);
    assert!(inner.is_app());
    drop(inner);
    assert_eq!(live_cells(), baseline);
}

#[test]
fn deep_binders() {
    let nat = mk_constant("nat", []);
    let mut t = mk_var(0);
    for _ in 0..100_000 {
        t = mk_pi("x", nat.clone(), t);
    }
    assert!(!has_free_var(&t, 0));
    // only the innermost Pi uses its variable
    assert!(is_arrow(&t));
    let copy = {
        let mut c = mk_var(0);
        for _ in 0..100_000 {
            c = mk_pi("y", nat.clone(), c);
        }
        c
    };
    assert_eq!(t, copy);
    assert!(t.check_metadata().is_ok());
}

#[test]
fn arrow_flag_is_stable() {
    let nat = mk_constant("nat", []);
    let arrow = mk_arrow(nat.clone(), mk_arrow(nat.clone(), nat.clone()));
    let dependent = mk_pi("n", nat.clone(), mk_app(nat, mk_var(0)));
    for _ in 0..3 {
        assert!(is_arrow(&arrow));
        assert!(!is_arrow(&dependent));
    }
    // the memoized flag agrees with a fresh computation
    assert!(arrow.check_metadata().is_ok());
    assert!(dependent.check_metadata().is_ok());
    assert!(is_arrow(&arrow.shallow_copy()));
}
