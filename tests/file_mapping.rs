//! Arrays stored in files and in caller-supplied mappings.

use std::fs::OpenOptions;

use mmap_array::{
    ArrayError, ArrayTag, ConstructionInput, ErrorKind, FileMapping, HeapMapping, MmapArray, Value,
};

#[test]
fn test_contents_survive_reopening() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ints.bin");
    {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)
            .unwrap();
        let mapping = FileMapping::new(file).unwrap();
        let mut arr = MmapArray::new_in(ArrayTag::I32, Box::new(mapping)).unwrap();
        assert!(arr.is_empty());
        arr.extend_values(vec![1, 2, 3]).unwrap();
    }
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 12);

    let file = OpenOptions::new().read(true).open(&path).unwrap();
    let mut arr =
        MmapArray::new_in(ArrayTag::I32, Box::new(FileMapping::read_only(file).unwrap())).unwrap();
    assert!(arr.is_read_only());
    assert_eq!(arr.len(), 3);
    assert_eq!(arr.get(0).unwrap(), Value::Int(1));

    let err = arr.set(0, 5).unwrap_err();
    assert!(matches!(err, ArrayError::ReadOnly));
    assert_eq!(err.kind(), ErrorKind::Permission);
    assert!(matches!(arr.append(4), Err(ArrayError::ReadOnly)));
    assert!(matches!(arr.reverse(), Err(ArrayError::ReadOnly)));
    assert_eq!(arr.to_list(), vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
}

#[test]
fn test_emptied_file_reopens_empty() {
    let file = tempfile::tempfile().unwrap();
    {
        let mapping = FileMapping::new(file.try_clone().unwrap()).unwrap();
        let mut arr = MmapArray::new_in(ArrayTag::U8, Box::new(mapping)).unwrap();
        arr.extend_values(vec![1u8, 2, 3]).unwrap();
        while !arr.is_empty() {
            arr.pop_last().unwrap();
        }
        assert_eq!(arr.buffer_info().1, 0);
    }
    assert_eq!(file.metadata().unwrap().len(), 0);

    let arr =
        MmapArray::new_in(ArrayTag::Char, Box::new(FileMapping::new(file).unwrap())).unwrap();
    assert!(arr.is_empty());
}

#[test]
fn test_adopted_mapping_is_truncated_to_whole_elements() {
    let mapping = HeapMapping::from_bytes(&[1, 0, 2, 0, 9]);
    let arr = MmapArray::new_in(ArrayTag::U16, Box::new(mapping)).unwrap();
    assert_eq!(arr.len(), 2);
    assert_eq!(arr.to_list(), vec![Value::UInt(1), Value::UInt(2)]);
}

#[test]
fn test_input_is_appended_to_explicit_mapping() {
    let mapping = HeapMapping::from_bytes(&[7]);
    let arr = MmapArray::with_input(
        ArrayTag::U8,
        ConstructionInput::Bytes(&[8, 9]),
        Some(Box::new(mapping)),
    )
    .unwrap();
    assert_eq!(arr.to_bytes(), vec![7, 8, 9]);
}

#[test]
fn test_resource_exhaustion_is_reported() {
    let mapping = HeapMapping::new(0).with_limit(16);
    let mut arr = MmapArray::new_in(ArrayTag::F64, Box::new(mapping)).unwrap();
    arr.extend_values(vec![1.0, 2.0]).unwrap();
    let err = arr.append(3.0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Resource);
    assert_eq!(arr.len(), 2);

    let err = arr.repeat_in_place(4).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Resource);
    assert_eq!(arr.to_list(), vec![Value::Float(1.0), Value::Float(2.0)]);
}

#[cfg(unix)]
#[test]
fn test_shared_memory_grows_and_shrinks() {
    let mut arr = MmapArray::new(ArrayTag::U64).unwrap();
    arr.extend_values((0..10_000u64).collect::<Vec<_>>()).unwrap();
    assert_eq!(arr.len(), 10_000);
    assert_eq!(arr.get(9_999).unwrap(), Value::UInt(9_999));
    arr.set_simple_slice(1, 10_000, &MmapArray::new(ArrayTag::U64).unwrap())
        .unwrap();
    assert_eq!(arr.to_list(), vec![Value::UInt(0)]);
    arr.pop_last().unwrap();
    assert!(arr.is_empty());
    assert_eq!(arr.buffer_info().1, 0);
}
