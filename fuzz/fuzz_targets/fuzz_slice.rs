#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use mmap_array::{resolve_slice, SliceSpec};

#[derive(Arbitrary, Debug)]
struct SliceInput {
    size: u8,
    start: Option<i16>,
    stop: Option<i16>,
    step: Option<i8>,
}

// Walks the positions one at a time instead of resolving arithmetically
fn positions(size: isize, start: Option<isize>, stop: Option<isize>, step: isize) -> Vec<usize> {
    let clamp = |v: isize, lo: isize, hi: isize| v.max(lo).min(hi);
    let norm = |v: isize| if v < 0 { v + size } else { v };
    let mut out = Vec::new();
    if step > 0 {
        let start = start.map_or(0, |v| clamp(norm(v), 0, size));
        let stop = stop.map_or(size, |v| clamp(norm(v), 0, size));
        let mut i = start;
        while i < stop {
            out.push(i as usize);
            i += step;
        }
    } else {
        let start = start.map_or(size - 1, |v| clamp(norm(v), -1, size - 1));
        let stop = stop.map_or(-1, |v| clamp(norm(v), -1, size - 1));
        let mut i = start;
        while i > stop {
            out.push(i as usize);
            i += step;
        }
    }
    out
}

fuzz_target!(|input: SliceInput| {
    let size = usize::from(input.size);
    let spec = SliceSpec::new(
        input.start.map(isize::from),
        input.stop.map(isize::from),
        input.step.map(isize::from),
    );
    let resolved = match resolve_slice(&spec, size) {
        Ok(resolved) => resolved,
        Err(_) => {
            assert_eq!(input.step, Some(0));
            return;
        }
    };
    assert_eq!((resolved.stop - resolved.start) % resolved.step, 0);
    assert_eq!(
        resolved.len as isize,
        (resolved.stop - resolved.start) / resolved.step
    );
    let expected = positions(
        size as isize,
        spec.start,
        spec.stop,
        resolved.step,
    );
    assert_eq!(resolved.indices().collect::<Vec<_>>(), expected);
});
