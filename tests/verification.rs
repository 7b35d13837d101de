mod support;

use support::{mocked_list, spied_list, List, ListDouble};
use test_doubles::matchers::{any, arg_that};
use test_doubles::{
    verify, verify_call, verify_no_interactions, verify_times, when, CallMatcher, DoubleSettings,
    InOrder, Mismatch, Times, UsageError, VerifyError,
};

#[test]
fn test_verify_before_any_call_fails() {
    let list = mocked_list();

    let error = verify(&list, |l| l.add("one".to_string())).unwrap_err();
    let failure = error.failure().unwrap();

    assert_eq!(failure.expected(), Times::once());
    assert_eq!(failure.actual(), 0);
    assert!(failure.recorded.is_empty());
    assert_eq!(
        error.to_string(),
        "verification failed: mockedList.add(\"one\"): wanted exactly 1 time but was invoked 0 times\nno interactions were recorded"
    );
}

#[test]
fn test_verify_exact_count() {
    let list = mocked_list();
    for _ in 0..3 {
        list.add("one".to_string());
    }

    assert!(verify_times(&list, Times::exactly(3), |l| l.add("one".to_string())).is_ok());
    assert!(verify(&list, |l| l.add("one".to_string())).is_err());
    assert!(verify_times(&list, Times::exactly(4), |l| l.add("one".to_string())).is_err());
    assert!(verify_times(&list, Times::at_least_once(), |l| l.add("one".to_string())).is_ok());
    assert!(verify_times(&list, Times::never(), |l| l.add("two".to_string())).is_ok());
}

#[test]
fn test_verification_is_repeatable() {
    let list = mocked_list();
    list.clear();

    for _ in 0..3 {
        verify(&list, |l| l.clear()).unwrap();
    }
    assert_eq!(list.double().invocations().len(), 1);
}

#[test]
fn test_failure_lists_grouped_calls() {
    let list = mocked_list();
    list.add("one".to_string());
    list.add("one".to_string());
    list.get(4);

    let error = verify(&list, |l| l.add("two".to_string())).unwrap_err();
    let text = error.to_string();

    assert!(text.contains("recorded interactions:"));
    assert!(text.contains("\n  add(\"one\") x2"));
    assert!(text.contains("\n  get(4)"));
}

#[test]
fn test_report_limit() {
    let settings = DoubleSettings::builder()
        .with_name("bounded")
        .with_report_limit(3)
        .build()
        .unwrap();
    let list = ListDouble::mock_with(settings).unwrap();
    for index in 0..10 {
        list.get(index);
    }

    let error = verify(&list, |l| l.size()).unwrap_err();
    let failure = error.failure().unwrap();

    assert_eq!(failure.double, "bounded");
    assert_eq!(failure.recorded.len(), 3);
    assert_eq!(failure.omitted, 7);
    assert!(error.to_string().ends_with("... and 7 more"));
}

#[test]
fn test_verify_call_with_matchers() {
    let list = mocked_list();
    list.get(1);
    list.get(20);
    list.get(300);

    assert!(verify_call(&list, &CallMatcher::new("get").with(any()), Times::exactly(3)).is_ok());

    let large = CallMatcher::new("get").with(arg_that("index >= 10", |index: &usize| *index >= 10));
    assert!(verify_call(&list, &large, Times::exactly(2)).is_ok());

    let error = verify_call(&list, &large, Times::at_most(1)).unwrap_err();
    assert_eq!(error.failure().map(|f| f.wanted.as_str()), Some("get(<index >= 10>)"));
}

#[test]
fn test_stubbed_calls_are_verifiable() {
    let list = mocked_list();
    when(&list, |l| l.size()).unwrap().then_return(2);

    assert!(verify_times(&list, Times::never(), |l| l.size()).is_ok());
    list.size();
    list.size();
    assert!(verify_times(&list, Times::exactly(2), |l| l.size()).is_ok());
}

#[test]
fn test_no_interactions() {
    let list = mocked_list();
    when(&list, |l| l.size()).unwrap().then_return(2);

    // Stubbing probes are not interactions
    assert!(verify_no_interactions(&list).is_ok());

    list.clear();
    let error = verify_no_interactions(&list).unwrap_err();
    assert!(matches!(
        error.failure().map(|f| &f.mismatch),
        Some(Mismatch::Unwanted { actual: 1 })
    ));
}

#[test]
fn test_in_order_between_mock_and_spy() {
    let mock = mocked_list();
    let spy = spied_list();

    spy.add("a".to_string());
    mock.clear();
    spy.add("b".to_string());

    let mut in_order = InOrder::new();
    in_order.verify(&spy, |l| l.add("a".to_string())).unwrap();
    in_order.verify(&mock, |l| l.clear()).unwrap();
    in_order.verify(&spy, |l| l.add("b".to_string())).unwrap();

    let mut reversed = InOrder::new();
    reversed.verify(&spy, |l| l.add("b".to_string())).unwrap();
    assert!(reversed.verify(&mock, |l| l.clear()).is_err());
}

#[test]
fn test_in_order_with_matcher_and_count() {
    let list = mocked_list();
    list.add("x".to_string());
    list.add("y".to_string());
    list.clear();

    let mut in_order = InOrder::new();
    in_order
        .verify_call(&list, &CallMatcher::new("add").with(any()), Times::exactly(2))
        .unwrap();
    in_order.verify(&list, |l| l.clear()).unwrap();
    in_order
        .verify_call(&list, &CallMatcher::new("add").with(any()), Times::never())
        .unwrap();
}

#[test]
fn test_in_order_with_repeated_call() {
    let list = mocked_list();
    list.add("a".to_string());
    list.clear();
    list.add("a".to_string());

    let mut in_order = InOrder::new();
    in_order.verify(&list, |l| l.add("a".to_string())).unwrap();
    in_order.verify(&list, |l| l.clear()).unwrap();
    in_order.verify(&list, |l| l.add("a".to_string())).unwrap();

    // Both calls are used up
    assert!(in_order.verify(&list, |l| l.add("a".to_string())).is_err());
    assert!(in_order
        .verify_times(&list, Times::never(), |l| l.add("a".to_string()))
        .is_ok());
}

#[test]
fn test_stub_only_refuses_verification() {
    let settings = DoubleSettings::builder().with_stub_only(true).build().unwrap();
    let list = ListDouble::mock_with(settings).unwrap();
    when(&list, |l| l.size()).unwrap().then_return(9);

    assert_eq!(list.size(), 9);
    assert!(list.double().invocations().is_empty());
    assert!(matches!(
        verify_no_interactions(&list),
        Err(VerifyError::Usage(UsageError::StubOnlyVerification { .. }))
    ));
}
