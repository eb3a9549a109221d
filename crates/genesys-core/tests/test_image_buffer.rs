use std::cell::{Cell, RefCell};
use std::rc::Rc;

use genesys_core::image::buffer::ProducerCallback;
use genesys_core::image::{ImageBuffer, PixelFormat};
use genesys_core::pipeline::{BufferedCallableSource, ImagePipelineStack};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Producer that records the size of every request and always succeeds.
fn recording_producer() -> (ProducerCallback, Rc<RefCell<Vec<usize>>>) {
    let requests = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&requests);
    let producer: ProducerCallback = Box::new(move |data: &mut [u8]| {
        log.borrow_mut().push(data.len());
        Ok(true)
    });
    (producer, requests)
}

// ---------------------------------------------------------------------------
// ImageBuffer
// ---------------------------------------------------------------------------

#[test]
fn test_exact_reads() {
    let (producer, requests) = recording_producer();
    let mut buffer = ImageBuffer::new(1000, producer);
    buffer.set_remaining_size(Some(2500));

    let mut dummy = vec![0u8; 1000];
    assert!(buffer.get_data(&mut dummy).unwrap());
    assert!(buffer.get_data(&mut dummy).unwrap());
    assert!(buffer.get_data(&mut dummy[..500]).unwrap());

    assert_eq!(*requests.borrow(), vec![1000, 1000, 500]);
}

#[test]
fn test_smaller_reads() {
    let (producer, requests) = recording_producer();
    let mut buffer = ImageBuffer::new(1000, producer);
    buffer.set_remaining_size(Some(2500));

    let mut dummy = vec![0u8; 700];
    assert!(buffer.get_data(&mut dummy[..600]).unwrap());
    assert!(buffer.get_data(&mut dummy[..600]).unwrap());
    assert!(buffer.get_data(&mut dummy[..600]).unwrap());
    assert!(buffer.get_data(&mut dummy).unwrap());

    assert_eq!(*requests.borrow(), vec![1000, 1000, 500]);
    assert_eq!(buffer.available(), 0);
}

#[test]
fn test_larger_reads() {
    let (producer, requests) = recording_producer();
    let mut buffer = ImageBuffer::new(1000, producer);
    buffer.set_remaining_size(Some(2500));

    let mut dummy = vec![0u8; 2500];
    assert!(buffer.get_data(&mut dummy).unwrap());

    assert_eq!(*requests.borrow(), vec![1000, 1000, 500]);
}

#[test]
fn test_uncapped_remaining_bytes() {
    let requests = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&requests);
    let producer: ProducerCallback = Box::new(move |data: &mut [u8]| {
        let mut log = log.borrow_mut();
        log.push(data.len());
        Ok(log.len() < 4)
    });
    let mut buffer = ImageBuffer::new(1000, producer);
    assert_eq!(buffer.remaining_size(), None);

    let mut dummy = vec![0u8; 3000];
    assert!(buffer.get_data(&mut dummy).unwrap());
    assert!(!buffer.get_data(&mut dummy).unwrap());

    assert_eq!(*requests.borrow(), vec![1000, 1000, 1000, 1000]);
}

#[test]
fn test_capped_remaining_bytes_rounds_last_read() {
    let (producer, requests) = recording_producer();
    let mut buffer = ImageBuffer::new(1000, producer);
    buffer.set_remaining_size(Some(10000));
    buffer.set_last_read_multiple(Some(16));

    let mut dummy = vec![0u8; 2000];
    assert!(buffer.get_data(&mut dummy).unwrap());
    assert!(buffer.get_data(&mut dummy).unwrap());
    assert_eq!(buffer.remaining_size(), Some(6000));

    buffer.set_remaining_size(Some(100));
    assert!(!buffer.get_data(&mut dummy[..200]).unwrap());

    assert_eq!(*requests.borrow(), vec![1000, 1000, 1000, 1000, 112]);
}

#[test]
fn test_producer_data_is_passed_through() {
    let counter = Rc::new(Cell::new(0u8));
    let next = Rc::clone(&counter);
    let producer: ProducerCallback = Box::new(move |data: &mut [u8]| {
        for b in data.iter_mut() {
            *b = next.get();
            next.set(next.get().wrapping_add(1));
        }
        Ok(true)
    });
    let mut buffer = ImageBuffer::new(4, producer);

    let mut out = [0u8; 6];
    assert!(buffer.get_data(&mut out).unwrap());
    assert_eq!(out, [0, 1, 2, 3, 4, 5]);
    assert_eq!(buffer.available(), 2);

    let mut out = [0u8; 3];
    assert!(buffer.get_data(&mut out).unwrap());
    assert_eq!(out, [6, 7, 8]);
    assert_eq!(counter.get(), 12);
}

// ---------------------------------------------------------------------------
// BufferedCallableSource
// ---------------------------------------------------------------------------

#[test]
fn test_buffered_callable_source_batches() {
    let in_data: Vec<u8> = (0..12).collect();
    let chunk_size = 3;
    let curr_index = Rc::new(Cell::new(0usize));

    let index = Rc::clone(&curr_index);
    let producer: ProducerCallback = Box::new(move |out: &mut [u8]| {
        assert_eq!(out.len(), chunk_size);
        let start = index.get();
        out.copy_from_slice(&in_data[start..start + chunk_size]);
        index.set(start + chunk_size);
        Ok(true)
    });

    let mut stack = ImagePipelineStack::new();
    stack
        .push_first_node(BufferedCallableSource::new(4, 3, PixelFormat::I8, chunk_size, producer))
        .unwrap();

    let mut out = [0u8; 4];
    assert_eq!(curr_index.get(), 0);

    assert!(stack.get_next_row_data(&mut out).unwrap());
    assert_eq!(out, [0, 1, 2, 3]);
    assert_eq!(curr_index.get(), 6);

    assert!(stack.get_next_row_data(&mut out).unwrap());
    assert_eq!(out, [4, 5, 6, 7]);
    assert_eq!(curr_index.get(), 9);

    assert!(stack.get_next_row_data(&mut out).unwrap());
    assert_eq!(out, [8, 9, 10, 11]);
    assert_eq!(curr_index.get(), 12);
}

#[test]
fn test_buffered_callable_source_reports_eof() {
    let producer: ProducerCallback = Box::new(|_: &mut [u8]| Ok(true));
    let mut stack = ImagePipelineStack::new();
    stack
        .push_first_node(BufferedCallableSource::new(2, 1, PixelFormat::I8, 16, producer))
        .unwrap();

    let mut out = [0u8; 2];
    assert!(stack.get_next_row_data(&mut out).unwrap());
    assert!(!stack.eof());
    assert!(!stack.get_next_row_data(&mut out).unwrap());
    assert!(stack.eof());
}
