use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use receptionist_onboarding::domain::{CustomerDataAccumulator, Plan, ProfileUpdate};
use receptionist_onboarding::forms::FormController;
use receptionist_onboarding::storage::JsonFileStore;
use receptionist_onboarding::validation::{validate, FieldType, ValidationContext};
use receptionist_onboarding::wizard::payment::business_form;
use tempfile::tempdir;

fn bench_field_validation(c: &mut Criterion) {
    let inputs = [
        ("dana.reyes@example.com", FieldType::Email),
        ("(020) 7946 0958", FieldType::Phone),
        ("Dana Reyes", FieldType::Name),
        ("1200 Congress Ave", FieldType::Address),
        ("SW1A 1AA", FieldType::ZipCode),
    ];
    let context = ValidationContext::named("Field").with_country(Some("GB"));

    c.bench_function("validate_mixed_fields", |b| {
        b.iter(|| {
            for (value, field_type) in inputs {
                black_box(validate(black_box(value), field_type, &context));
            }
        })
    });
}

fn bench_form_validation(c: &mut Criterion) {
    c.bench_function("business_form_validate", |b| {
        b.iter_batched(
            || {
                let mut form = FormController::empty(business_form());
                form.set_country_code(Some("US"));
                for (key, value) in [
                    ("company", "Reyes Dental"),
                    ("address1", "1200 Congress Ave"),
                    ("country", "US"),
                    ("state", "TX"),
                    ("city", "Austin"),
                    ("zip", "73301"),
                    ("mobileNumber", "512 555 0142"),
                ] {
                    form.set_field_value(key, value);
                }
                form
            },
            |mut form| black_box(form.validate_form()),
            BatchSize::SmallInput,
        )
    });
}

fn bench_persist_round(c: &mut Criterion) {
    let dir = tempdir().expect("tempdir");
    let store = Arc::new(JsonFileStore::new(dir.path().to_path_buf()).expect("store"));
    let plan = Plan::new("pro", "Professional", 99.0);
    let mut accumulator = CustomerDataAccumulator::new(store.clone());
    accumulator.update_profile_data(ProfileUpdate {
        full_name: Some("Dana Reyes".into()),
        email: Some("dana@example.com".into()),
        ..ProfileUpdate::default()
    });

    c.bench_function("persist_and_restore", |b| {
        b.iter(|| {
            accumulator.persist(Some(&plan)).expect("persist");
            let mut restored = CustomerDataAccumulator::new(store.clone());
            black_box(restored.restore_persisted().expect("restore"));
        })
    });
}

criterion_group!(
    benches,
    bench_field_validation,
    bench_form_validation,
    bench_persist_round
);
criterion_main!(benches);
