// SPDX-License-Identifier: MIT OR Apache-2.0
//! Interchangeable error kinds the scenarios remap.

use rethrow_core::error_kinds;

error_kinds! {
    /// First source kind.
    pub struct OtherError;
    /// Source kind #2.
    pub struct OtherError2;
    /// Source kind #3.
    pub struct OtherError3;
    /// Source kind #4.
    pub struct OtherError4;
    /// Source kind #5.
    pub struct OtherError5;
    /// Source kind #6, the one the scenarios actually fail with.
    pub struct OtherError6;
    /// Source kind #7.
    pub struct OtherError7;
    /// Source kind #8.
    pub struct OtherError8;
    /// Source kind #9.
    pub struct OtherError9;
    /// Source kind #10.
    pub struct OtherError10;
    /// Source kind #11.
    pub struct OtherError11;
    /// Source kind #12.
    pub struct OtherError12;
    /// Source kind #13.
    pub struct OtherError13;
    /// Last source kind.
    pub struct CustomError;
}
