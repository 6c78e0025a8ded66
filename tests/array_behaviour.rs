//! Sequence behaviour of arrays backed by anonymous shared memory.

use mmap_array::{
    ArrayError, ArrayTag, ConstructionInput, ErrorKind, MmapArray, SliceSpec, Value,
};

fn int_array(tag: ArrayTag, values: &[i64]) -> MmapArray {
    let values = values.iter().map(|&v| Value::Int(v)).collect();
    MmapArray::with_input(tag, ConstructionInput::Values(values), None).unwrap()
}

fn ints(arr: &MmapArray) -> Vec<i64> {
    arr.iter()
        .map(|v| match v {
            Value::Int(i) => i,
            other => panic!("expected an integer, got {:?}", other),
        })
        .collect()
}

#[test]
fn test_fresh_arrays_are_empty() {
    for &tag in ArrayTag::ALL {
        let mut arr = MmapArray::new(tag).unwrap();
        assert_eq!(arr.len(), 0);
        let value = match tag {
            ArrayTag::Char => Value::Byte(b'x'),
            ArrayTag::WideChar => Value::Char('x'),
            _ => Value::Int(1),
        };
        arr.append(value.clone()).unwrap();
        assert_eq!(arr.len(), 1);
        assert_eq!(arr.get(0).unwrap(), value);
    }
}

#[test]
fn test_typecodes() {
    let arr = MmapArray::from_typecode('q').unwrap();
    assert_eq!(arr.element_type(), ArrayTag::I64);
    assert_eq!(arr.typecode(), 'l');
    assert_eq!(arr.itemsize(), 8);
    let err = MmapArray::from_typecode('x').unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Value);
}

#[test]
fn test_slice_geometry_matches_reference() {
    let reference: Vec<i64> = (0..10).map(|i| 2 * i + 1).collect();
    let arr = int_array(ArrayTag::I32, &reference);
    for start in 0..10 {
        for stop in 0..10 {
            for step in 1..10 {
                let spec = SliceSpec::new(Some(start), Some(stop), Some(step));
                let expected: Vec<i64> = (start..stop)
                    .step_by(step as usize)
                    .map(|i| reference[i as usize])
                    .collect();
                assert_eq!(ints(&arr.get_slice(spec).unwrap()), expected);
            }
        }
    }
    assert_eq!(ints(&arr), reference);
}

#[test]
fn test_negative_slices() {
    let arr = int_array(ArrayTag::I64, &[0, 1, 2, 3, 4, 5]);
    assert_eq!(ints(&arr.get_slice(-2..).unwrap()), vec![4, 5]);
    assert_eq!(
        ints(&arr.get_slice(SliceSpec::full().step_by(-1)).unwrap()),
        vec![5, 4, 3, 2, 1, 0]
    );
    assert_eq!(
        ints(&arr.get_slice(SliceSpec::new(Some(-1), Some(0), Some(-2))).unwrap()),
        vec![5, 3, 1]
    );
    assert!(arr.get_slice(SliceSpec::full().step_by(0)).is_err());
    assert_eq!(ints(&arr.get_simple_slice(-3, 2).unwrap()), vec![0, 1]);
}

#[test]
fn test_round_trips_bytes() {
    let arr = int_array(ArrayTag::I16, &[-3, 0, 7]);
    let copy = MmapArray::with_input(
        ArrayTag::I16,
        ConstructionInput::Bytes(&arr.to_bytes()),
        None,
    )
    .unwrap();
    assert_eq!(copy, arr);

    let err = MmapArray::with_input(ArrayTag::I16, ConstructionInput::Bytes(&[1, 2, 3]), None)
        .unwrap_err();
    assert!(matches!(err, ArrayError::NotMultiple { len: 3, itemsize: 2 }));
}

#[test]
fn test_reverse_twice_restores() {
    let mut arr = int_array(ArrayTag::I32, &[1, 2, 3, 4, 5]);
    arr.reverse().unwrap();
    assert_eq!(ints(&arr), vec![5, 4, 3, 2, 1]);
    arr.reverse().unwrap();
    assert_eq!(ints(&arr), vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_insert_then_pop_is_identity() {
    let original = int_array(ArrayTag::I32, &[10, 20, 30]);
    for i in 0..=3 {
        let mut arr = original.try_clone().unwrap();
        arr.insert(i, 99).unwrap();
        assert_eq!(arr.pop(i).unwrap(), Value::Int(99));
        assert_eq!(arr, original);
    }
}

#[test]
fn test_extended_slice_mismatch_leaves_array_unchanged() {
    let mut arr = int_array(ArrayTag::I32, &[0, 1, 2, 3]);
    let replacement = int_array(ArrayTag::I32, &[7, 7, 7]);
    let err = arr
        .set_slice(SliceSpec::full().step_by(2), &replacement)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Length);
    assert_eq!(ints(&arr), vec![0, 1, 2, 3]);
}

#[test]
fn test_self_extend() {
    let mut arr = int_array(ArrayTag::I32, &[1, 2]);
    arr.extend_from_within(..).unwrap();
    assert_eq!(ints(&arr), vec![1, 2, 1, 2]);

    let snapshot = arr.get_slice(..).unwrap();
    arr.extend(&snapshot).unwrap();
    assert_eq!(arr.len(), 8);
}

#[test]
fn test_repeat() {
    let arr = int_array(ArrayTag::I32, &[1, 2]);
    assert_eq!(ints(&arr.repeated(3).unwrap()), vec![1, 2, 1, 2, 1, 2]);
    assert!(arr.repeated(0).unwrap().is_empty());
    assert!(arr.repeated(-5).unwrap().is_empty());
    assert_eq!(ints(&arr), vec![1, 2]);

    let mut grown = arr.try_clone().unwrap();
    grown.repeat_in_place(7).unwrap();
    assert_eq!(ints(&grown), [1i64, 2].repeat(7));
}

#[test]
fn test_byteswap_is_an_involution() {
    for &tag in &[ArrayTag::I16, ArrayTag::U32, ArrayTag::I64, ArrayTag::F64] {
        let mut arr = int_array(tag, &[1, 300, 20_000]);
        let before = arr.to_bytes();
        arr.byteswap().unwrap();
        assert_ne!(arr.to_bytes(), before);
        arr.byteswap().unwrap();
        assert_eq!(arr.to_bytes(), before);
    }
    let mut bytes = int_array(ArrayTag::I8, &[1, 2]);
    bytes.byteswap().unwrap();
    assert_eq!(ints(&bytes), vec![1, 2]);
}

#[test]
fn test_comparisons() {
    let a = int_array(ArrayTag::I32, &[1, 2, 3]);
    let b = int_array(ArrayTag::I32, &[1, 3, 2]);
    assert!(a < b);
    assert!(!(a > b));
    assert!(a != b);

    let prefix = int_array(ArrayTag::I32, &[1, 2]);
    assert!(prefix < a);
    assert!(prefix != a);

    let wide = int_array(ArrayTag::I64, &[1, 2, 3]);
    assert!(a == wide);
    let floats = MmapArray::with_input(
        ArrayTag::F32,
        ConstructionInput::Values(vec![Value::Float(1.0), Value::Float(2.5)]),
        None,
    )
    .unwrap();
    assert!(prefix < floats);
}

#[test]
fn test_construction_is_all_or_nothing() {
    let err = MmapArray::with_input(
        ArrayTag::U8,
        ConstructionInput::Values(vec![Value::Int(1), Value::Int(256)]),
        None,
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Overflow);

    let other = int_array(ArrayTag::I32, &[1]);
    let err = MmapArray::with_input(ArrayTag::I16, ConstructionInput::Array(&other), None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Type);

    let text =
        MmapArray::with_input(ArrayTag::WideChar, ConstructionInput::Text("mmap"), None).unwrap();
    assert_eq!(text.to_text().unwrap(), "mmap");
    let err = MmapArray::with_input(ArrayTag::I32, ConstructionInput::Text("mmap"), None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Value);
}

#[test]
fn test_concat_and_clone_are_independent() {
    let a = int_array(ArrayTag::I32, &[1, 2]);
    let b = int_array(ArrayTag::I32, &[3]);
    let mut joined = a.concat(&b).unwrap();
    joined.set(0, 100).unwrap();
    assert_eq!(ints(&joined), vec![100, 2, 3]);
    assert_eq!(ints(&a), vec![1, 2]);
}

#[test]
fn test_strict_indices() {
    let mut arr = int_array(ArrayTag::I32, &[1, 2, 3]);
    assert_eq!(arr.get(-3).unwrap(), Value::Int(1));
    assert_eq!(arr.get(3).unwrap_err().kind(), ErrorKind::Range);
    assert_eq!(arr.set(-4, 0).unwrap_err().kind(), ErrorKind::Range);
    let empty = MmapArray::new(ArrayTag::I32).unwrap();
    assert_eq!(empty.get(0).unwrap_err().kind(), ErrorKind::Range);
    arr.remove(2).unwrap();
    assert_eq!(ints(&arr), vec![1, 3]);
    assert!(matches!(arr.remove(2), Err(ArrayError::NotFound(_))));
}

#[test]
fn test_stream_io() {
    let arr = int_array(ArrayTag::U16, &[1, 2, 3]);
    let mut out = Vec::new();
    arr.write_to(&mut out).unwrap();

    let mut back = MmapArray::new(ArrayTag::U16).unwrap();
    back.from_reader(&out[..], 3).unwrap();
    assert_eq!(back, arr);

    let err = back.from_reader(&out[..5], 3).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Incomplete);
    assert_eq!(back.len(), 5);
}

#[test]
fn test_buffer_info_tracks_length() {
    let mut arr = MmapArray::new(ArrayTag::F64).unwrap();
    assert_eq!(arr.buffer_info().1, 0);
    arr.extend_values(vec![1.0, 2.0]).unwrap();
    let (address, len) = arr.buffer_info();
    assert_ne!(address, 0);
    assert_eq!(len, 16);
}

#[test]
fn test_serializes_as_sequence() {
    let arr = int_array(ArrayTag::I8, &[-1, 2]);
    assert_eq!(serde_json::to_string(&arr).unwrap(), "[-1,2]");
}
