use genesys_core::error::GenesysError;
use genesys_core::image::RowBuffer;

fn push_pop_forward(size: u8) {
    let mut buf = RowBuffer::new(1);
    assert!(buf.empty());

    for i in 0..size {
        buf.push_back();
        buf.back_mut().unwrap()[0] = i;
        for j in 0..=i {
            assert_eq!(buf.get_row(j as usize).unwrap()[0], j, "size {size}, row {j}");
        }
    }
    assert!(!buf.empty());

    for i in 0..10u8 {
        assert_eq!(buf.height(), size as usize);
        assert_eq!(buf.front().unwrap()[0], i);
        buf.pop_front().unwrap();
        assert_eq!(buf.height(), size as usize - 1);
        buf.push_back();
        buf.back_mut().unwrap()[0] = i + size;
    }
}

fn push_pop_backward(size: u8) {
    let mut buf = RowBuffer::new(1);
    assert!(buf.empty());

    for i in 0..size {
        buf.push_front();
        buf.front_mut().unwrap()[0] = i;
        for j in 0..=i {
            assert_eq!(buf.get_row(j as usize).unwrap()[0], i - j, "size {size}, row {j}");
        }
    }
    assert!(!buf.empty());

    for i in 0..10u8 {
        assert_eq!(buf.height(), size as usize);
        assert_eq!(buf.back().unwrap()[0], i);
        buf.pop_back().unwrap();
        assert_eq!(buf.height(), size as usize - 1);
        buf.push_front();
        buf.front_mut().unwrap()[0] = i + size;
    }
}

#[test]
fn test_push_pop_forward() {
    for size in 1..5 {
        push_pop_forward(size);
    }
}

#[test]
fn test_push_pop_backward() {
    for size in 1..5 {
        push_pop_backward(size);
    }
}

#[test]
fn test_pop_empty_fails() {
    let mut buf = RowBuffer::new(4);
    assert!(matches!(buf.pop_front(), Err(GenesysError::EmptyRowBuffer)));
    assert!(matches!(buf.pop_back(), Err(GenesysError::EmptyRowBuffer)));
    assert!(buf.back().is_err());
}

#[test]
fn test_get_row_out_of_range() {
    let mut buf = RowBuffer::new(2);
    buf.push_back();
    buf.push_back();
    match buf.get_row(2) {
        Err(GenesysError::RowIndexOutOfRange { index, height }) => {
            assert_eq!(index, 2);
            assert_eq!(height, 2);
        }
        other => panic!("expected RowIndexOutOfRange, got {other:?}"),
    }
}

#[test]
fn test_linearize_keeps_row_order() {
    let mut buf = RowBuffer::new(2);
    for i in 0..3u8 {
        buf.push_back();
        buf.back_mut().unwrap().copy_from_slice(&[i, i]);
    }
    // Push in front until the ring wraps.
    buf.push_front();
    buf.front_mut().unwrap().copy_from_slice(&[9, 9]);
    assert!(!buf.is_linear());
    assert!(buf.linear_data().is_err());

    buf.linearize();
    assert!(buf.is_linear());
    assert_eq!(buf.linear_data().unwrap(), &[9, 9, 0, 0, 1, 1, 2, 2]);
}

#[test]
fn test_clear_keeps_capacity() {
    let mut buf = RowBuffer::new(3);
    buf.ensure_capacity(8);
    buf.push_back();
    buf.push_back();
    buf.clear();
    assert!(buf.empty());
    assert_eq!(buf.height(), 0);
    assert_eq!(buf.height_capacity(), 8);
    assert_eq!(buf.linear_data().unwrap(), &[] as &[u8]);
}
