#![no_main]
use libfuzzer_sys::fuzz_target;
use meetinglist_libs::time::normalize_time_slot;

fuzz_target!(|slot: &str| {
    let normalized = normalize_time_slot(slot);

    if slot.contains("AM") || slot.contains("PM") {
        assert_eq!(normalized, slot, "Slots with a meridiem are left alone");
    }

    if normalized.contains("AM") || normalized.contains("PM") {
        assert_eq!(
            normalize_time_slot(&normalized),
            normalized,
            "Normalizing twice changes nothing"
        );
    }
});
