//! 立即数还原辅助函数
//!
//! 编解码器按模板顺序拼接拆分字段，这里把拼接值还原成带符号偏移。

/// 将低 `bits` 位视为有符号数做符号扩展
#[inline]
pub fn sign_extend(value: u32, bits: u32) -> i64 {
    let shift = 64 - bits;
    ((value as i64) << shift) >> shift
}

/// I/S 型 12 位立即数
#[inline]
pub fn imm12(value: u32) -> i64 {
    sign_extend(value, 12)
}

/// B 型偏移
///
/// 拼接值（12 位）：`[11]=imm[12] [10:5]=imm[10:5] [4:1]=imm[4:1] [0]=imm[11]`
#[inline]
pub fn branch_offset(value: u32) -> i64 {
    let imm12 = (value >> 11) & 0x1;
    let imm10_5 = (value >> 5) & 0x3F;
    let imm4_1 = (value >> 1) & 0xF;
    let imm11 = value & 0x1;
    let imm = (imm12 << 12) | (imm11 << 11) | (imm10_5 << 5) | (imm4_1 << 1);
    sign_extend(imm, 13)
}

/// J 型偏移
///
/// 拼接值（20 位）：`[19]=imm[20] [18:9]=imm[10:1] [8]=imm[11] [7:0]=imm[19:12]`
#[inline]
pub fn jump_offset(value: u32) -> i64 {
    let imm20 = (value >> 19) & 0x1;
    let imm10_1 = (value >> 9) & 0x3FF;
    let imm11 = (value >> 8) & 0x1;
    let imm19_12 = value & 0xFF;
    let imm = (imm20 << 20) | (imm19_12 << 12) | (imm11 << 11) | (imm10_1 << 1);
    sign_extend(imm, 21)
}

/// U 型立即数（已左移 12 位并符号扩展）
#[inline]
pub fn upper_imm(value: u32) -> i64 {
    sign_extend(value << 12, 32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isa::codec::Codec;

    #[test]
    fn test_sign_extend() {
        assert_eq!(sign_extend(0xFFF, 12), -1);
        assert_eq!(sign_extend(0x7FF, 12), 2047);
        assert_eq!(imm12(0x800), -2048);
    }

    #[test]
    fn test_branch_offset_from_codec() {
        let codec = Codec::compile("iiiiiii ttttt sssss 000 iiiii 1100011").unwrap();
        // beq x1, x2, +8
        assert_eq!(branch_offset(codec.decode(0x0020_8463).imm()), 8);
        // beq x0, x0, -4
        assert_eq!(branch_offset(codec.decode(0xFE00_0EE3).imm()), -4);
    }

    #[test]
    fn test_jump_offset_from_codec() {
        let codec = Codec::compile("iiiiiiiiiiiiiiiiiiii ddddd 1101111").unwrap();
        // jal x0, 0 (自循环)
        assert_eq!(jump_offset(codec.decode(0x0000_006F).imm()), 0);
        // jal x1, +2048
        assert_eq!(jump_offset(codec.decode(0x0010_00EF).imm()), 2048);
        // jal x0, -8
        assert_eq!(jump_offset(codec.decode(0xFF9F_F06F).imm()), -8);
    }

    #[test]
    fn test_upper_imm() {
        assert_eq!(upper_imm(0x12345), 0x1234_5000);
        assert_eq!(upper_imm(0xFFFFF), -4096);
    }
}
