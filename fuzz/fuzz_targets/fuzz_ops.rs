#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use mmap_array::{ArrayTag, HeapMapping, MmapArray, SliceSpec, Value};

#[derive(Arbitrary, Debug)]
enum Op {
    Append(i16),
    Insert(i8, i16),
    Pop(i8),
    Set(i8, i16),
    SetRun(i8, i8, Vec<i16>),
    ExtendWithin(Option<i8>, Option<i8>, Option<i8>),
    Repeat(i8),
    Reverse,
}

fn contents(arr: &MmapArray) -> Vec<i16> {
    arr.iter()
        .map(|v| match v {
            Value::Int(i) => i as i16,
            other => panic!("unexpected {:?}", other),
        })
        .collect()
}

fuzz_target!(|ops: Vec<Op>| {
    let mut arr = MmapArray::new_in(ArrayTag::I16, Box::new(HeapMapping::new(0))).unwrap();
    let mut model: Vec<i16> = Vec::new();

    for op in ops {
        let len = model.len() as isize;
        match op {
            Op::Append(v) => {
                arr.append(v).unwrap();
                model.push(v);
            }
            Op::Insert(i, v) => {
                arr.insert(isize::from(i), v).unwrap();
                let i = isize::from(i);
                let at = if i < 0 { (i + len).max(0) } else { i.min(len) };
                model.insert(at as usize, v);
            }
            Op::Pop(i) => {
                let i = isize::from(i);
                let at = if i < 0 { i + len } else { i };
                match arr.pop(i) {
                    Ok(v) => assert_eq!(v, Value::from(model.remove(at as usize))),
                    Err(_) => assert!(at < 0 || at >= len),
                }
            }
            Op::Set(i, v) => {
                let i = isize::from(i);
                let at = if i < 0 { i + len } else { i };
                if arr.set(i, v).is_ok() {
                    model[at as usize] = v;
                }
            }
            Op::SetRun(i, j, values) => {
                if model.len() + values.len() > 4096 {
                    continue;
                }
                let (start, stop, _) =
                    mmap_array::resolve_simple(isize::from(i), isize::from(j), model.len());
                let mut run = MmapArray::new_in(ArrayTag::I16, Box::new(HeapMapping::new(0))).unwrap();
                run.extend_values(values.iter().copied()).unwrap();
                arr.set_simple_slice(isize::from(i), isize::from(j), &run).unwrap();
                model.splice(start..stop, values);
            }
            Op::ExtendWithin(start, stop, step) => {
                if model.len() > 2048 {
                    continue;
                }
                let spec = SliceSpec::new(
                    start.map(isize::from),
                    stop.map(isize::from),
                    step.map(isize::from),
                );
                let copied = arr.get_slice(spec);
                match arr.extend_from_within(spec) {
                    Ok(()) => model.extend(contents(&copied.unwrap())),
                    Err(_) => assert_eq!(step, Some(0)),
                }
            }
            Op::Repeat(n) => {
                let n = isize::from(n % 4);
                if model.len() > 1024 {
                    continue;
                }
                arr.repeat_in_place(n).unwrap();
                model = if n <= 0 { Vec::new() } else { model.repeat(n as usize) };
            }
            Op::Reverse => {
                arr.reverse().unwrap();
                model.reverse();
            }
        }
        assert_eq!(contents(&arr), model);
    }
});
