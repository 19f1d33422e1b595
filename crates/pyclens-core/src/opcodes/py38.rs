use super::{def, free_op, jabs_op, jrel_op, local_op, name_op, const_op, OpInfo};

pub(super) static OPCODES: &[OpInfo] = &[
    def(1, "POP_TOP"),
    def(2, "ROT_TWO"),
    def(3, "ROT_THREE"),
    def(4, "DUP_TOP"),
    def(5, "DUP_TOP_TWO"),
    def(6, "ROT_FOUR"),
    def(9, "NOP"),
    def(10, "UNARY_POSITIVE"),
    def(11, "UNARY_NEGATIVE"),
    def(12, "UNARY_NOT"),
    def(15, "UNARY_INVERT"),
    def(16, "BINARY_MATRIX_MULTIPLY"),
    def(17, "INPLACE_MATRIX_MULTIPLY"),
    def(19, "BINARY_POWER"),
    def(20, "BINARY_MULTIPLY"),
    def(22, "BINARY_MODULO"),
    def(23, "BINARY_ADD"),
    def(24, "BINARY_SUBTRACT"),
    def(25, "BINARY_SUBSCR"),
    def(26, "BINARY_FLOOR_DIVIDE"),
    def(27, "BINARY_TRUE_DIVIDE"),
    def(28, "INPLACE_FLOOR_DIVIDE"),
    def(29, "INPLACE_TRUE_DIVIDE"),
    def(50, "GET_AITER"),
    def(51, "GET_ANEXT"),
    def(52, "BEFORE_ASYNC_WITH"),
    def(53, "BEGIN_FINALLY"),
    def(54, "END_ASYNC_FOR"),
    def(55, "INPLACE_ADD"),
    def(56, "INPLACE_SUBTRACT"),
    def(57, "INPLACE_MULTIPLY"),
    def(59, "INPLACE_MODULO"),
    def(60, "STORE_SUBSCR"),
    def(61, "DELETE_SUBSCR"),
    def(62, "BINARY_LSHIFT"),
    def(63, "BINARY_RSHIFT"),
    def(64, "BINARY_AND"),
    def(65, "BINARY_XOR"),
    def(66, "BINARY_OR"),
    def(67, "INPLACE_POWER"),
    def(68, "GET_ITER"),
    def(69, "GET_YIELD_FROM_ITER"),
    def(70, "PRINT_EXPR"),
    def(71, "LOAD_BUILD_CLASS"),
    def(72, "YIELD_FROM"),
    def(73, "GET_AWAITABLE"),
    def(75, "INPLACE_LSHIFT"),
    def(76, "INPLACE_RSHIFT"),
    def(77, "INPLACE_AND"),
    def(78, "INPLACE_XOR"),
    def(79, "INPLACE_OR"),
    def(81, "WITH_CLEANUP_START"),
    def(82, "WITH_CLEANUP_FINISH"),
    def(83, "RETURN_VALUE"),
    def(84, "IMPORT_STAR"),
    def(85, "SETUP_ANNOTATIONS"),
    def(86, "YIELD_VALUE"),
    def(87, "POP_BLOCK"),
    def(88, "END_FINALLY"),
    def(89, "POP_EXCEPT"),
    name_op(90, "STORE_NAME"),
    name_op(91, "DELETE_NAME"),
    def(92, "UNPACK_SEQUENCE"),
    jrel_op(93, "FOR_ITER"),
    def(94, "UNPACK_EX"),
    name_op(95, "STORE_ATTR"),
    name_op(96, "DELETE_ATTR"),
    name_op(97, "STORE_GLOBAL"),
    name_op(98, "DELETE_GLOBAL"),
    const_op(100, "LOAD_CONST"),
    name_op(101, "LOAD_NAME"),
    def(102, "BUILD_TUPLE"),
    def(103, "BUILD_LIST"),
    def(104, "BUILD_SET"),
    def(105, "BUILD_MAP"),
    name_op(106, "LOAD_ATTR"),
    def(107, "COMPARE_OP"),
    name_op(108, "IMPORT_NAME"),
    name_op(109, "IMPORT_FROM"),
    jrel_op(110, "JUMP_FORWARD"),
    jabs_op(111, "JUMP_IF_FALSE_OR_POP"),
    jabs_op(112, "JUMP_IF_TRUE_OR_POP"),
    jabs_op(113, "JUMP_ABSOLUTE"),
    jabs_op(114, "POP_JUMP_IF_FALSE"),
    jabs_op(115, "POP_JUMP_IF_TRUE"),
    name_op(116, "LOAD_GLOBAL"),
    jrel_op(122, "SETUP_FINALLY"),
    local_op(124, "LOAD_FAST"),
    local_op(125, "STORE_FAST"),
    local_op(126, "DELETE_FAST"),
    def(130, "RAISE_VARARGS"),
    def(131, "CALL_FUNCTION"),
    def(132, "MAKE_FUNCTION"),
    def(133, "BUILD_SLICE"),
    free_op(135, "LOAD_CLOSURE"),
    free_op(136, "LOAD_DEREF"),
    free_op(137, "STORE_DEREF"),
    free_op(138, "DELETE_DEREF"),
    def(141, "CALL_FUNCTION_KW"),
    def(142, "CALL_FUNCTION_EX"),
    jrel_op(143, "SETUP_WITH"),
    def(144, "EXTENDED_ARG"),
    def(145, "LIST_APPEND"),
    def(146, "SET_ADD"),
    def(147, "MAP_ADD"),
    free_op(148, "LOAD_CLASSDEREF"),
    def(149, "BUILD_LIST_UNPACK"),
    def(150, "BUILD_MAP_UNPACK"),
    def(151, "BUILD_MAP_UNPACK_WITH_CALL"),
    def(152, "BUILD_TUPLE_UNPACK"),
    def(153, "BUILD_SET_UNPACK"),
    jrel_op(154, "SETUP_ASYNC_WITH"),
    def(155, "FORMAT_VALUE"),
    def(156, "BUILD_CONST_KEY_MAP"),
    def(157, "BUILD_STRING"),
    def(158, "BUILD_TUPLE_UNPACK_WITH_CALL"),
    name_op(160, "LOAD_METHOD"),
    def(161, "CALL_METHOD"),
    jrel_op(162, "CALL_FINALLY"),
    def(163, "POP_FINALLY"),
];
