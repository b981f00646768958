use thiserror::Error;

/// Errors that can occur while expanding a zero-coded body
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ZeroCodeError {
    /// A zero marker was the last byte, so the run length is missing
    #[error("Zero run marker at offset {offset} has no length byte")]
    MissingRunLength { offset: usize },

    /// A zero marker carried a run length of zero
    #[error("Zero run marker at offset {offset} has a length of zero")]
    EmptyRun { offset: usize },

    /// The expanded body would exceed the configured limit (possible malicious packet)
    #[error("Zero-coded body expands beyond the {limit} byte limit")]
    ExpansionLimit { limit: usize },
}

/// Replace every run of zero bytes with a `0x00, count` pair
pub fn zero_encode(input: &[u8]) -> Vec<u8> {
    let mut output = Vec::with_capacity(input.len());
    let mut run: u8 = 0;

    for byte in input {
        if *byte == 0 {
            if run == u8::MAX {
                output.push(0);
                output.push(run);
                run = 0;
            }
            run += 1;
            continue;
        }
        if run > 0 {
            output.push(0);
            output.push(run);
            run = 0;
        }
        output.push(*byte);
    }

    if run > 0 {
        output.push(0);
        output.push(run);
    }

    output
}

/// Expand a zero-coded body, refusing to produce more than `limit` bytes
pub fn zero_decode(input: &[u8], limit: usize) -> Result<Vec<u8>, ZeroCodeError> {
    let mut output = Vec::with_capacity(input.len() * 2);
    let mut index = 0;

    while index < input.len() {
        let byte = input[index];
        if byte != 0 {
            output.push(byte);
            index += 1;
        } else {
            let Some(run) = input.get(index + 1) else {
                return Err(ZeroCodeError::MissingRunLength { offset: index });
            };
            if *run == 0 {
                return Err(ZeroCodeError::EmptyRun { offset: index });
            }
            output.resize(output.len() + *run as usize, 0);
            index += 2;
        }

        if output.len() > limit {
            return Err(ZeroCodeError::ExpansionLimit { limit });
        }
    }

    Ok(output)
}
